//! Image loads handed to the page, keyed by ticket serial.
//!
//! The page echoes the serial back with the finished image. A serial that
//! is no longer here belongs to a load whose slot moved on to another key,
//! and its image is dropped.

use sd_render::{AssetCache, AssetKey, LoadTicket};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct LoadBook {
    tickets: HashMap<u64, LoadTicket>,
}

impl LoadBook {
    /// Request everything in `needed`, drop slots no longer needed, and
    /// forget tickets that went stale. Returns the loads the page must start.
    pub fn issue<I>(
        &mut self,
        cache: &mut AssetCache<I>,
        needed: Vec<(String, AssetKey)>,
    ) -> Vec<LoadTicket> {
        let keep: Vec<String> = needed.iter().map(|(s, _)| s.clone()).collect();
        cache.retain_slots(&keep);

        let mut started = Vec::new();
        for (slot, key) in needed {
            if let Some(ticket) = cache.request(&slot, key) {
                started.push(ticket.clone());
                self.tickets.insert(ticket.serial(), ticket);
            }
        }
        self.tickets.retain(|_, t| cache.is_current(t));
        started
    }

    pub fn take(&mut self, serial: u64) -> Option<LoadTicket> {
        self.tickets.remove(&serial)
    }

    pub fn clear(&mut self) {
        self.tickets.clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.tickets.len()
    }
}
