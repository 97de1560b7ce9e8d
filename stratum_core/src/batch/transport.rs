// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client-to-server batch transport.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use thiserror::Error;

use super::{Batch, BatchBuilder, SequenceId};
use crate::time::HostTime;

/// The other end of a batch channel is gone.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The server dropped its receiver.
    #[error("batch receiver has been disconnected")]
    ReceiverGone,
    /// Every sender was dropped and no batch is pending.
    #[error("batch sender has been disconnected")]
    SenderGone,
}

/// Creates a connected sender/receiver pair.
#[must_use]
pub fn batch_channel() -> (BatchSender, BatchReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (
        BatchSender {
            tx,
            next_sequence: 1,
        },
        BatchReceiver { rx },
    )
}

/// Client side: seals builders into batches with increasing sequence ids.
#[derive(Debug)]
pub struct BatchSender {
    tx: Sender<Batch>,
    next_sequence: u64,
}

impl BatchSender {
    /// Sequence id the next commit will carry.
    #[inline]
    #[must_use]
    pub fn next_sequence_id(&self) -> SequenceId {
        SequenceId(self.next_sequence)
    }

    /// Commits `builder` as the next batch.
    ///
    /// The sequence id is consumed even if the send fails, so a later commit
    /// never reuses it.
    pub fn commit(
        &mut self,
        builder: BatchBuilder,
        committed_at: HostTime,
    ) -> Result<SequenceId, TransportError> {
        let sequence_id = SequenceId(self.next_sequence);
        self.next_sequence += 1;
        self.tx
            .send(builder.finish(sequence_id, committed_at))
            .map_err(|_| TransportError::ReceiverGone)?;
        Ok(sequence_id)
    }
}

/// Server side: hands out whatever was fully received, never blocking.
#[derive(Debug)]
pub struct BatchReceiver {
    rx: Receiver<Batch>,
}

impl BatchReceiver {
    /// Takes every batch received so far, in commit order.
    ///
    /// Returns [`TransportError::SenderGone`] only once the client has hung
    /// up and nothing is left to apply.
    pub fn drain(&self) -> Result<Vec<Batch>, TransportError> {
        let mut batches = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(batch) => batches.push(batch),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) if batches.is_empty() => {
                    return Err(TransportError::SenderGone);
                }
                Err(TryRecvError::Disconnected) => break,
            }
        }
        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::TargetId;

    #[test]
    fn sequence_ids_increase() {
        let (mut tx, rx) = batch_channel();
        assert_eq!(tx.next_sequence_id(), SequenceId(1));
        let mut b = BatchBuilder::new();
        b.create_target(TargetId(1));
        assert_eq!(tx.commit(b, HostTime(10)), Ok(SequenceId(1)));
        assert_eq!(tx.commit(BatchBuilder::new(), HostTime(20)), Ok(SequenceId(2)));

        let batches = rx.drain().expect("sender alive");
        let ids: Vec<_> = batches.iter().map(|b| b.sequence_id).collect();
        assert_eq!(ids, vec![SequenceId(1), SequenceId(2)]);
        assert_eq!(batches[0].committed_at, HostTime(10));
        assert!(rx.drain().expect("sender alive").is_empty(), "drain never blocks");
    }

    #[test]
    fn pending_batches_outlive_the_sender() {
        let (mut tx, rx) = batch_channel();
        tx.commit(BatchBuilder::new(), HostTime(0)).expect("receiver alive");
        drop(tx);
        assert_eq!(rx.drain().map(|b| b.len()), Ok(1));
        assert_eq!(rx.drain().map(|b| b.len()), Err(TransportError::SenderGone));
    }

    #[test]
    fn commit_fails_without_receiver() {
        let (mut tx, rx) = batch_channel();
        drop(rx);
        assert_eq!(
            tx.commit(BatchBuilder::new(), HostTime(0)),
            Err(TransportError::ReceiverGone)
        );
        assert_eq!(tx.next_sequence_id(), SequenceId(2));
    }
}
