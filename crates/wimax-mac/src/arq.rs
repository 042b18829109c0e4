//! Selective-repeat ARQ per transport connection.
//!
//! One `ArqEngine` carries both directions of a connection: the transmit
//! half segments SDUs into fixed-size blocks and tracks them in a circular
//! array of `window_size + 1` entries, the receive half reassembles blocks
//! back into SDUs and produces cumulative/selective feedback.

use std::collections::HashMap;
use std::fmt;

use wimax_config::ArqConfig;
use wimax_core::{is_bsn_in_window, Bsn, Cid};
use wimax_pdus::arq::feedback::NACK_BITMAP_BITS;
use wimax_pdus::arq::{ArqAckType, ArqDiscard, ArqFeedback, FragControl};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArqErr {
    /// Segmenting the SDU would exceed the transmit window
    WindowFull { needed: u16, free: u16 },
}

impl fmt::Display for ArqErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArqErr::WindowFull { needed, free } => {
                write!(f, "arq window full: need {} block slots, {} free", needed, free)
            }
        }
    }
}

/// Coarse transmit-side state, derived from the window occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArqState {
    Idle,
    Active,
    WindowFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    /// Segmented but never put on the air
    NotSent,
    /// Transmitted, no feedback yet
    Outstanding,
    /// Due for retransmission
    WaitRetransmit,
    /// Positively acknowledged
    Acked,
    /// Abandoned after exhausting the retry budget
    Discarded,
}

/// One transmit-window entry: a block-sized fragment of an SDU
#[derive(Debug, Clone)]
pub struct ArqBlock {
    pub bsn: Bsn,
    pub fc: FragControl,
    pub payload: Vec<u8>,
    state: BlockState,
    retries: u8,
}

/// What a round of feedback (or a retry timeout) did to the transmit window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackOutcome {
    /// Blocks released by the cumulative ACK
    pub acked: u16,
    /// Blocks abandoned because they hit the retry limit
    pub dropped_bsns: Vec<Bsn>,
    /// Notification to send to the peer when blocks were abandoned
    pub discard: Option<ArqDiscard>,
}

/// Result of handing one received block to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RxOutcome {
    /// The block completed one or more SDUs, delivered in order
    Delivered(Vec<Vec<u8>>),
    /// In-window but earlier blocks are still missing
    Buffered,
    /// Already held; dropped
    Duplicate,
    /// Outside the receive window; dropped
    OutOfWindow,
}

pub struct ArqEngine {
    cid: Cid,
    cfg: ArqConfig,

    // Transmit half. `blocks` is a circular array of window_size + 1
    // entries; `front` indexes the block holding `tx_window_start` and
    // `rear` the next insertion point.
    blocks: Vec<Option<ArqBlock>>,
    front: usize,
    rear: usize,
    tx_window_start: Bsn,
    tx_next_bsn: Bsn,

    // Receive half. The window start only advances over fully delivered
    // SDUs (or a peer discard), so every buffered block is at or beyond it.
    rx_window_start: Bsn,
    rx_seen_any: bool,
    rx_buffer: HashMap<u16, (FragControl, Vec<u8>)>,
}

impl ArqEngine {
    pub fn new(cid: Cid, cfg: ArqConfig) -> Self {
        let array_size = cfg.window_size as usize + 1;
        ArqEngine {
            cid,
            cfg,
            blocks: vec![None; array_size],
            front: 0,
            rear: 0,
            tx_window_start: Bsn(0),
            tx_next_bsn: Bsn(0),
            rx_window_start: Bsn(0),
            rx_seen_any: false,
            rx_buffer: HashMap::new(),
        }
    }

    pub fn cid(&self) -> Cid {
        self.cid
    }

    fn array_size(&self) -> usize {
        self.blocks.len()
    }

    /// Blocks currently occupying the transmit window
    pub fn outstanding(&self) -> u16 {
        ((self.rear + self.array_size() - self.front) % self.array_size()) as u16
    }

    pub fn tx_state(&self) -> ArqState {
        match self.outstanding() {
            0 => ArqState::Idle,
            n if n >= self.cfg.window_size => ArqState::WindowFull,
            _ => ArqState::Active,
        }
    }

    fn block_at(&self, offset: u16) -> Option<&ArqBlock> {
        let idx = (self.front + offset as usize) % self.array_size();
        self.blocks[idx].as_ref()
    }

    fn block_at_mut(&mut self, offset: u16) -> Option<&mut ArqBlock> {
        let idx = (self.front + offset as usize) % self.array_size();
        self.blocks[idx].as_mut()
    }

    ///////// TRANSMIT HALF /////////

    /// Segments one SDU into window blocks and assigns BSNs. Nothing is
    /// admitted if the whole SDU does not fit.
    pub fn segment(&mut self, sdu: &[u8]) -> Result<Vec<Bsn>, ArqErr> {
        if sdu.is_empty() {
            return Ok(Vec::new());
        }
        let block_size = self.cfg.block_size as usize;
        let needed = sdu.len().div_ceil(block_size) as u16;
        let free = self.cfg.window_size - self.outstanding();
        if needed > free {
            return Err(ArqErr::WindowFull { needed, free });
        }

        let mut assigned = Vec::with_capacity(needed as usize);
        for (i, chunk) in sdu.chunks(block_size).enumerate() {
            let fc = match (needed, i as u16) {
                (1, _) => FragControl::Unfragmented,
                (_, 0) => FragControl::First,
                (n, k) if k == n - 1 => FragControl::Last,
                _ => FragControl::Middle,
            };
            let bsn = self.tx_next_bsn;
            self.tx_next_bsn = self.tx_next_bsn.next();
            self.blocks[self.rear] = Some(ArqBlock {
                bsn,
                fc,
                payload: chunk.to_vec(),
                state: BlockState::NotSent,
                retries: 0,
            });
            self.rear = (self.rear + 1) % self.array_size();
            assigned.push(bsn);
        }
        tracing::trace!(
            "arq {}: segmented {} bytes into {} blocks, window now {}/{}",
            self.cid,
            sdu.len(),
            needed,
            self.outstanding(),
            self.cfg.window_size
        );
        Ok(assigned)
    }

    /// Next block due on the air: retransmissions before first transmissions,
    /// each group in window order.
    pub fn peek_transmit(&self) -> Option<&ArqBlock> {
        let occupied = self.outstanding();
        let mut first_unsent: Option<u16> = None;
        for offset in 0..occupied {
            match self.block_at(offset).map(|b| b.state) {
                Some(BlockState::WaitRetransmit) => return self.block_at(offset),
                Some(BlockState::NotSent) if first_unsent.is_none() => {
                    first_unsent = Some(offset);
                }
                _ => {}
            }
        }
        first_unsent.and_then(|offset| self.block_at(offset))
    }

    /// Marks a block handed out by `peek_transmit` as on the air
    pub fn mark_transmitted(&mut self, bsn: Bsn) {
        let offset = bsn.wrapping_sub(self.tx_window_start);
        if offset >= self.outstanding() {
            return;
        }
        if let Some(block) = self.block_at_mut(offset) {
            block.state = BlockState::Outstanding;
        }
    }

    /// Applies peer feedback: releases cumulatively acknowledged blocks,
    /// schedules NACKed blocks for retransmission, and abandons blocks whose
    /// retry budget is spent.
    pub fn on_feedback(&mut self, fb: &ArqFeedback) -> FeedbackOutcome {
        let mut dropped = Vec::new();

        // Everything strictly before the cumulative BSN is delivered.
        let cum_offset = fb.cumulative_bsn.wrapping_sub(self.tx_window_start);
        if cum_offset > 0 && cum_offset <= self.outstanding() {
            for offset in 0..cum_offset {
                if let Some(block) = self.block_at_mut(offset) {
                    block.state = BlockState::Acked;
                }
            }
        }

        if fb.ack_type == ArqAckType::CumulativeSelective {
            for bsn in fb.nacked_bsns() {
                let offset = bsn.wrapping_sub(self.tx_window_start);
                if offset >= self.outstanding() {
                    continue;
                }
                self.retry_or_drop(offset, &mut dropped);
            }
        }

        self.finish_window_round(dropped)
    }

    /// Retry timer expiry: every block on the air without feedback goes back
    /// to the retransmission queue, spending one retry each.
    pub fn on_retry_timeout(&mut self) -> FeedbackOutcome {
        let mut dropped = Vec::new();
        for offset in 0..self.outstanding() {
            if self.block_at(offset).map(|b| b.state) == Some(BlockState::Outstanding) {
                self.retry_or_drop(offset, &mut dropped);
            }
        }
        self.finish_window_round(dropped)
    }

    fn retry_or_drop(&mut self, offset: u16, dropped: &mut Vec<Bsn>) {
        let retry_limit = self.cfg.retry_limit;
        if let Some(block) = self.block_at_mut(offset) {
            if block.state == BlockState::Acked || block.state == BlockState::Discarded {
                return;
            }
            block.retries += 1;
            if block.retries > retry_limit {
                block.state = BlockState::Discarded;
                dropped.push(block.bsn);
            } else {
                block.state = BlockState::WaitRetransmit;
            }
        }
    }

    fn finish_window_round(&mut self, dropped: Vec<Bsn>) -> FeedbackOutcome {
        let mut outcome = FeedbackOutcome { acked: self.release_front(), ..Default::default() };
        if let Some(&first) = dropped.first() {
            // Notify the peer about the leading contiguous run only; later
            // runs get their own notification once the window reaches them.
            let mut end = first;
            for &bsn in &dropped[1..] {
                if bsn == end.next() {
                    end = bsn;
                } else {
                    break;
                }
            }
            outcome.discard = Some(ArqDiscard { cid: self.cid, start_bsn: first, end_bsn: end });
            tracing::debug!(
                "arq {}: abandoned {} blocks after retry limit {}",
                self.cid,
                dropped.len(),
                self.cfg.retry_limit
            );
        }
        outcome.dropped_bsns = dropped;
        outcome
    }

    /// Slides the window start past leading Acked/Discarded blocks.
    /// Returns the number of Acked blocks released.
    fn release_front(&mut self) -> u16 {
        let mut acked = 0;
        while self.front != self.rear {
            match self.blocks[self.front].as_ref().map(|b| b.state) {
                Some(BlockState::Acked) => acked += 1,
                Some(BlockState::Discarded) => {}
                _ => break,
            }
            self.blocks[self.front] = None;
            self.front = (self.front + 1) % self.array_size();
            self.tx_window_start = self.tx_window_start.next();
        }
        acked
    }

    ///////// RECEIVE HALF /////////

    /// Accepts one block from the peer. In-order blocks may complete SDUs,
    /// which are returned oldest first.
    pub fn on_receive(&mut self, fc: FragControl, bsn: Bsn, payload: Vec<u8>) -> RxOutcome {
        if !is_bsn_in_window(bsn, self.rx_window_start, self.cfg.window_size) {
            tracing::debug!(
                "arq {}: dropping out-of-window {} (window starts at {})",
                self.cid,
                bsn,
                self.rx_window_start
            );
            return RxOutcome::OutOfWindow;
        }
        if self.rx_buffer.contains_key(&bsn.0) {
            return RxOutcome::Duplicate;
        }
        self.rx_seen_any = true;
        self.rx_buffer.insert(bsn.0, (fc, payload));

        let delivered = self.deliver_in_order();
        if delivered.is_empty() { RxOutcome::Buffered } else { RxOutcome::Delivered(delivered) }
    }

    /// Reassembles every SDU whose blocks are now contiguous from the
    /// window start, advancing the window past each one.
    fn deliver_in_order(&mut self) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        'sdu: loop {
            let start = self.rx_window_start;
            let first_fc = match self.rx_buffer.get(&start.0) {
                Some((fc, _)) => *fc,
                None => break,
            };
            // An SDU must begin on an Unfragmented or First block; anything
            // else is a remnant of a partially discarded SDU.
            if first_fc == FragControl::Middle || first_fc == FragControl::Last {
                self.rx_buffer.remove(&start.0);
                self.rx_window_start = self.rx_window_start.next();
                continue;
            }
            // Walk to the closing block, bailing if any piece is missing.
            let mut len = 1u16;
            let mut cursor = start;
            let mut closing = first_fc;
            while closing == FragControl::First || closing == FragControl::Middle {
                cursor = cursor.next();
                match self.rx_buffer.get(&cursor.0) {
                    Some((fc, _)) => {
                        closing = *fc;
                        len += 1;
                    }
                    None => break 'sdu,
                }
            }
            let mut sdu = Vec::new();
            let mut bsn = start;
            for _ in 0..len {
                if let Some((_, payload)) = self.rx_buffer.remove(&bsn.0) {
                    sdu.extend_from_slice(&payload);
                }
                bsn = bsn.next();
            }
            self.rx_window_start = bsn;
            out.push(sdu);
        }
        out
    }

    /// Builds the feedback message describing the current receive state:
    /// a cumulative ACK at the first gap, plus a selective bitmap whenever
    /// blocks beyond the gap have already arrived. None until the peer has
    /// sent anything at all.
    pub fn build_feedback(&self) -> Option<ArqFeedback> {
        if !self.rx_seen_any {
            return None;
        }
        let cum = self.rx_window_start;
        // A gap is only known to be a gap once something beyond it has
        // arrived; the horizon is the farthest buffered block.
        let horizon = self
            .rx_buffer
            .keys()
            .map(|&k| Bsn(k).wrapping_sub(cum))
            .filter(|&d| d < self.cfg.window_size)
            .max();
        let mut bitmap: u16 = 0;
        if let Some(horizon) = horizon {
            for i in 0..NACK_BITMAP_BITS {
                if i <= horizon && !self.rx_buffer.contains_key(&cum.wrapping_add(i).0) {
                    bitmap |= 1 << (NACK_BITMAP_BITS - 1 - i);
                }
            }
        }
        let ack_type =
            if bitmap == 0 { ArqAckType::Cumulative } else { ArqAckType::CumulativeSelective };
        Some(ArqFeedback { cid: self.cid, ack_type, cumulative_bsn: cum, nack_bitmap: bitmap })
    }

    /// Handles a discard notification from the peer: gives up on the named
    /// range and resynchronizes the receive window past it. Stale ranges
    /// that end before the window are ignored.
    pub fn on_discard(&mut self, discard: &ArqDiscard) -> Vec<Vec<u8>> {
        if !is_bsn_in_window(discard.end_bsn, self.rx_window_start, self.cfg.window_size) {
            return Vec::new();
        }
        let new_start = discard.end_bsn.next();
        let mut bsn = self.rx_window_start;
        while bsn != new_start {
            self.rx_buffer.remove(&bsn.0);
            bsn = bsn.next();
        }
        self.rx_window_start = new_start;
        tracing::debug!(
            "arq {}: peer discarded {}..={}, window resynced to {}",
            self.cid,
            discard.start_bsn,
            discard.end_bsn,
            new_start
        );
        self.deliver_in_order()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(window: u16, block: u16, retries: u8) -> ArqConfig {
        ArqConfig { window_size: window, block_size: block, retry_limit: retries }
    }

    fn drain_to(tx: &mut ArqEngine, rx: &mut ArqEngine) -> Vec<Vec<u8>> {
        let mut delivered = Vec::new();
        while let Some(block) = tx.peek_transmit() {
            let (bsn, fc, payload) = (block.bsn, block.fc, block.payload.clone());
            tx.mark_transmitted(bsn);
            if let RxOutcome::Delivered(mut sdus) = rx.on_receive(fc, bsn, payload) {
                delivered.append(&mut sdus);
            }
        }
        delivered
    }

    #[test]
    fn test_segment_assigns_frag_controls() {
        let mut eng = ArqEngine::new(Cid(600), cfg(16, 4, 4));
        assert_eq!(eng.segment(&[0; 4]).unwrap(), vec![Bsn(0)]);
        assert_eq!(eng.segment(&[0; 10]).unwrap(), vec![Bsn(1), Bsn(2), Bsn(3)]);
        let fcs: Vec<FragControl> = (0..4u16).map(|i| eng.block_at(i).unwrap().fc).collect();
        assert_eq!(
            fcs,
            vec![
                FragControl::Unfragmented,
                FragControl::First,
                FragControl::Middle,
                FragControl::Last
            ]
        );
        // last block carries the 2-byte remainder
        assert_eq!(eng.block_at(3).unwrap().payload.len(), 2);
    }

    #[test]
    fn test_window_full_is_all_or_nothing() {
        let mut eng = ArqEngine::new(Cid(600), cfg(4, 8, 4));
        eng.segment(&[0; 24]).unwrap(); // 3 blocks
        let err = eng.segment(&[0; 16]).unwrap_err();
        assert_eq!(err, ArqErr::WindowFull { needed: 2, free: 1 });
        // the rejected SDU consumed nothing
        assert_eq!(eng.outstanding(), 3);
        eng.segment(&[0; 8]).unwrap();
        assert_eq!(eng.tx_state(), ArqState::WindowFull);
    }

    #[test]
    fn test_reassembly_is_exact_for_every_block_count() {
        let window = 16u16;
        for blocks in 1..=window as usize {
            let mut tx = ArqEngine::new(Cid(650), cfg(window, 8, 4));
            let mut rx = ArqEngine::new(Cid(650), cfg(window, 8, 4));
            let sdu: Vec<u8> = (0..blocks * 8).map(|i| i as u8).collect();
            tx.segment(&sdu).unwrap();
            let delivered = drain_to(&mut tx, &mut rx);
            assert_eq!(delivered, vec![sdu], "sdu of {} blocks", blocks);
        }
    }

    #[test]
    fn test_lossless_transfer_delivers_in_order() {
        let mut tx = ArqEngine::new(Cid(700), cfg(32, 16, 4));
        let mut rx = ArqEngine::new(Cid(700), cfg(32, 16, 4));
        let sdus: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i; 40]).collect();
        for sdu in &sdus {
            tx.segment(sdu).unwrap();
        }
        let delivered = drain_to(&mut tx, &mut rx);
        assert_eq!(delivered, sdus);

        let fb = rx.build_feedback().unwrap();
        assert_eq!(fb.ack_type, ArqAckType::Cumulative);
        assert_eq!(fb.cumulative_bsn, Bsn(15));
        let outcome = tx.on_feedback(&fb);
        assert_eq!(outcome.acked, 15);
        assert_eq!(tx.tx_state(), ArqState::Idle);
    }

    #[test]
    fn test_selective_feedback_recovers_a_hole() {
        let mut tx = ArqEngine::new(Cid(701), cfg(16, 8, 4));
        let mut rx = ArqEngine::new(Cid(701), cfg(16, 8, 4));
        tx.segment(&[7; 32]).unwrap(); // blocks 0..=3

        // Transmit all four but lose block 1 on the air.
        for _ in 0..4 {
            let block = tx.peek_transmit().unwrap();
            let (bsn, fc, payload) = (block.bsn, block.fc, block.payload.clone());
            tx.mark_transmitted(bsn);
            if bsn != Bsn(1) {
                rx.on_receive(fc, bsn, payload);
            }
        }
        let fb = rx.build_feedback().unwrap();
        assert_eq!(fb.ack_type, ArqAckType::CumulativeSelective);
        assert_eq!(fb.cumulative_bsn, Bsn(0));
        assert_eq!(fb.nacked_bsns(), vec![Bsn(1)]);

        tx.on_feedback(&fb);
        // Only the hole is retransmitted, and it completes the SDU.
        let block = tx.peek_transmit().unwrap();
        assert_eq!(block.bsn, Bsn(1));
        let (bsn, fc, payload) = (block.bsn, block.fc, block.payload.clone());
        tx.mark_transmitted(bsn);
        match rx.on_receive(fc, bsn, payload) {
            RxOutcome::Delivered(sdus) => assert_eq!(sdus, vec![vec![7; 32]]),
            other => panic!("expected delivery, got {:?}", other),
        }
        assert!(tx.peek_transmit().is_none());
    }

    #[test]
    fn test_feedback_converges_under_repeated_loss() {
        use rand::{Rng, SeedableRng, rngs::StdRng};

        let mut tx = ArqEngine::new(Cid(702), cfg(64, 8, 30));
        let mut rx = ArqEngine::new(Cid(702), cfg(64, 8, 30));
        let sdus: Vec<Vec<u8>> = (0..6u8).map(|i| vec![i; 24]).collect();
        for sdu in &sdus {
            tx.segment(sdu).unwrap();
        }

        // Lose a third of all transmissions, then run feedback/timeout
        // rounds until the transmit window drains.
        let mut rng = StdRng::seed_from_u64(0x5016);
        let mut delivered = Vec::new();
        let mut tick = 0u32;
        loop {
            while let Some(block) = tx.peek_transmit() {
                let (bsn, fc, payload) = (block.bsn, block.fc, block.payload.clone());
                tx.mark_transmitted(bsn);
                tick += 1;
                if rng.random_range(0..3u8) == 0 {
                    continue; // lost on the air
                }
                if let RxOutcome::Delivered(mut sdus) = rx.on_receive(fc, bsn, payload) {
                    delivered.append(&mut sdus);
                }
            }
            if tx.tx_state() == ArqState::Idle {
                break;
            }
            let fb = rx.build_feedback().unwrap();
            let outcome = tx.on_feedback(&fb);
            assert!(outcome.dropped_bsns.is_empty());
            if tx.peek_transmit().is_none() {
                // losses past the bitmap horizon only recover via timeout
                assert!(tx.on_retry_timeout().dropped_bsns.is_empty());
            }
            assert!(tick < 5000, "did not converge");
        }
        assert_eq!(delivered, sdus);
    }

    #[test]
    fn test_retry_limit_drops_block_and_notifies_peer() {
        let mut tx = ArqEngine::new(Cid(703), cfg(16, 8, 2));
        tx.segment(&[1; 16]).unwrap(); // blocks 0, 1
        for _ in 0..2 {
            let bsn = tx.peek_transmit().unwrap().bsn;
            tx.mark_transmitted(bsn);
        }
        // The peer keeps reporting block 0 missing.
        let nack = ArqFeedback {
            cid: Cid(703),
            ack_type: ArqAckType::CumulativeSelective,
            cumulative_bsn: Bsn(0),
            nack_bitmap: 0b1000_0000_0000_0000,
        };
        for _ in 0..2 {
            let outcome = tx.on_feedback(&nack);
            assert!(outcome.dropped_bsns.is_empty());
            let bsn = tx.peek_transmit().unwrap().bsn;
            assert_eq!(bsn, Bsn(0));
            tx.mark_transmitted(bsn);
        }
        let outcome = tx.on_feedback(&nack);
        assert_eq!(outcome.dropped_bsns, vec![Bsn(0)]);
        let discard = outcome.discard.unwrap();
        assert_eq!((discard.start_bsn, discard.end_bsn), (Bsn(0), Bsn(0)));
        // window slid past the abandoned block
        assert_eq!(tx.tx_window_start, Bsn(1));
    }

    #[test]
    fn test_discard_resynchronizes_receiver() {
        let mut rx = ArqEngine::new(Cid(704), cfg(16, 8, 4));
        // Block 0 of the first SDU is lost and later abandoned by the
        // peer; block 1 and the following whole SDU arrive.
        rx.on_receive(FragControl::Last, Bsn(1), vec![9; 8]);
        rx.on_receive(FragControl::Unfragmented, Bsn(2), vec![5; 8]);
        assert_eq!(rx.build_feedback().unwrap().cumulative_bsn, Bsn(0));

        let delivered =
            rx.on_discard(&ArqDiscard { cid: Cid(704), start_bsn: Bsn(0), end_bsn: Bsn(0) });
        // the orphaned Last block at bsn 1 is swept, the intact SDU at
        // bsn 2 comes through
        assert_eq!(delivered, vec![vec![5; 8]]);
        assert_eq!(rx.build_feedback().unwrap().cumulative_bsn, Bsn(3));
    }

    #[test]
    fn test_stale_discard_is_ignored() {
        let mut rx = ArqEngine::new(Cid(705), cfg(16, 8, 4));
        rx.on_receive(FragControl::Unfragmented, Bsn(0), vec![1; 8]);
        assert_eq!(rx.rx_window_start, Bsn(1));
        let delivered =
            rx.on_discard(&ArqDiscard { cid: Cid(705), start_bsn: Bsn(900), end_bsn: Bsn(901) });
        assert!(delivered.is_empty());
        assert_eq!(rx.rx_window_start, Bsn(1));
    }

    #[test]
    fn test_out_of_window_receive_is_rejected() {
        let mut rx = ArqEngine::new(Cid(706), cfg(16, 8, 4));
        assert_eq!(
            rx.on_receive(FragControl::Unfragmented, Bsn(16), vec![0; 8]),
            RxOutcome::OutOfWindow
        );
        assert_eq!(
            rx.on_receive(FragControl::Unfragmented, Bsn(2047), vec![0; 8]),
            RxOutcome::OutOfWindow
        );
        assert_eq!(
            rx.on_receive(FragControl::Unfragmented, Bsn(15), vec![0; 8]),
            RxOutcome::Buffered
        );
        assert_eq!(
            rx.on_receive(FragControl::Unfragmented, Bsn(15), vec![0; 8]),
            RxOutcome::Duplicate
        );
    }

    #[test]
    fn test_window_wraps_across_modulus() {
        let mut tx = ArqEngine::new(Cid(707), cfg(32, 8, 4));
        let mut rx = ArqEngine::new(Cid(707), cfg(32, 8, 4));
        // Push enough single-block SDUs through to wrap the 11-bit space.
        for round in 0..2112u16 {
            tx.segment(&[round as u8; 8]).unwrap();
            let delivered = drain_to(&mut tx, &mut rx);
            assert_eq!(delivered, vec![vec![round as u8; 8]]);
            let fb = rx.build_feedback().unwrap();
            tx.on_feedback(&fb);
            assert_eq!(tx.tx_state(), ArqState::Idle);
        }
        assert_eq!(tx.tx_window_start, Bsn(2112 % 2048));
    }
}
