//! Per-subframe slot accounting. Bursts are packed along a column-major
//! raster over the (symbol column, subchannel) grid, so every grant is a
//! disjoint run of PS indices and the map can never double-book a slot.

/// Placement of one granted burst inside the subframe grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstDescriptor {
    /// First PS index of the run, in raster order
    pub start_ps: u32,
    pub num_ps: u32,
    pub symbol_offset: u8,
    pub subchannel_offset: u8,
    pub num_symbols: u8,
    pub num_subchannels: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MapState {
    Open,
    Closed,
}

/// Tracks free capacity of one subframe while the scheduler fills it
#[derive(Debug)]
pub struct AllocationMap {
    num_subchannels: u32,
    symbols_per_ps: u32,
    total_ps: u32,
    cursor: u32,
    state: MapState,
}

impl AllocationMap {
    pub fn new(num_subchannels: u32, symbols_per_ps: u32) -> Self {
        AllocationMap {
            num_subchannels,
            symbols_per_ps,
            total_ps: 0,
            cursor: 0,
            state: MapState::Closed,
        }
    }

    /// Reopens the map for a new subframe with the given slot budget
    pub fn reset(&mut self, total_ps: u32) {
        self.total_ps = total_ps;
        self.cursor = 0;
        self.state = MapState::Open;
    }

    pub fn remaining_ps(&self) -> u32 {
        self.total_ps - self.cursor
    }

    pub fn is_open(&self) -> bool {
        self.state == MapState::Open
    }

    /// Seals the map; further allocation attempts always fail
    pub fn close(&mut self) {
        self.state = MapState::Closed;
    }

    /// Claims `num_ps` contiguous slots. Returns None without any side
    /// effect when the map is closed or the run does not fit.
    pub fn try_allocate(&mut self, num_ps: u32) -> Option<BurstDescriptor> {
        if self.state == MapState::Closed || num_ps == 0 || num_ps > self.remaining_ps() {
            return None;
        }
        let start_ps = self.cursor;
        self.cursor += num_ps;

        let first_col = start_ps / self.num_subchannels;
        let first_row = start_ps % self.num_subchannels;
        let last_col = (self.cursor - 1) / self.num_subchannels;
        let cols = last_col - first_col + 1;
        let rows = if cols == 1 { num_ps } else { self.num_subchannels };

        Some(BurstDescriptor {
            start_ps,
            num_ps,
            symbol_offset: (first_col * self.symbols_per_ps) as u8,
            subchannel_offset: first_row as u8,
            num_symbols: (cols * self.symbols_per_ps) as u8,
            num_subchannels: rows as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_conservation() {
        let mut map = AllocationMap::new(30, 2);
        map.reset(100);
        let mut granted = 0;
        for req in [7, 30, 1, 40, 40, 22] {
            if let Some(b) = map.try_allocate(req) {
                granted += b.num_ps;
            }
        }
        assert_eq!(granted + map.remaining_ps(), 100);
    }

    #[test]
    fn test_failed_allocation_has_no_side_effect() {
        let mut map = AllocationMap::new(30, 2);
        map.reset(10);
        assert!(map.try_allocate(11).is_none());
        assert_eq!(map.remaining_ps(), 10);
        assert!(map.try_allocate(10).is_some());
        assert_eq!(map.remaining_ps(), 0);
    }

    #[test]
    fn test_grants_are_disjoint_runs() {
        let mut map = AllocationMap::new(35, 3);
        map.reset(70);
        let a = map.try_allocate(20).unwrap();
        let b = map.try_allocate(35).unwrap();
        assert_eq!(a.start_ps + a.num_ps, b.start_ps);
        assert_eq!(a.subchannel_offset, 0);
        assert_eq!(b.subchannel_offset, 20);
    }

    #[test]
    fn test_column_spanning_descriptor() {
        let mut map = AllocationMap::new(10, 2);
        map.reset(40);
        map.try_allocate(5).unwrap();
        // Run crossing from column 0 into column 1
        let b = map.try_allocate(10).unwrap();
        assert_eq!(b.symbol_offset, 0);
        assert_eq!(b.num_symbols, 4);
        assert_eq!(b.num_subchannels, 10);
    }

    #[test]
    fn test_closed_map_rejects() {
        let mut map = AllocationMap::new(30, 2);
        map.reset(50);
        map.close();
        assert!(map.try_allocate(1).is_none());
        map.reset(50);
        assert!(map.try_allocate(1).is_some());
    }
}
