use crate::core::types::{Command, CommandKind};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;
use uuid::Uuid;

/// Ordered queue of pending commands shared by every caller of a client.
///
/// Append and drain are mutually exclusive, so a command appended while a
/// drain is in progress ends up either in the drained batch or in the next
/// one. The drain order is the insertion order, which is the only thing
/// that ties a response element back to its command.
///
/// The lock is never held across an `.await`. A poisoned lock is recovered:
/// push and take leave the sequence consistent even if a holder panicked.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: RwLock<Vec<Command>>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Command>> {
        self.commands.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Command>> {
        self.commands.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Assign a fresh uid and push the command to the tail. Returns the uid.
    pub fn append(&self, kind: CommandKind) -> String {
        let uid = Uuid::new_v4().to_string();
        let command = Command::new(uid.clone(), kind);

        let mut commands = self.write();
        commands.push(command);
        trace!(uid = %uid, pending = commands.len(), "command buffered");
        uid
    }

    /// Take every pending command, leaving the buffer empty.
    pub fn drain_all(&self) -> Vec<Command> {
        std::mem::take(&mut *self.write())
    }

    /// Precondition check only. Another caller may append right after this
    /// returns.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Drop every pending command without sending it. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut commands = self.write();
        let dropped = commands.len();
        commands.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn presence(channel: &str) -> CommandKind {
        CommandKind::Presence {
            channel: channel.to_string(),
        }
    }

    #[test]
    fn test_drain_preserves_insertion_order() {
        let buffer = CommandBuffer::new();
        let uids: Vec<String> = (0..5)
            .map(|i| buffer.append(presence(&format!("chan-{}", i))))
            .collect();

        let drained = buffer.drain_all();
        assert_eq!(drained.len(), 5);
        for (i, command) in drained.iter().enumerate() {
            assert_eq!(command.uid(), uids[i]);
            assert_eq!(command.kind(), &presence(&format!("chan-{}", i)));
        }
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_uids_are_distinct_and_non_empty() {
        let buffer = CommandBuffer::new();
        for _ in 0..100 {
            buffer.append(CommandKind::Stats {});
        }
        let drained = buffer.drain_all();
        let uids: HashSet<&str> = drained.iter().map(|c| c.uid()).collect();
        assert_eq!(uids.len(), 100);
        assert!(uids.iter().all(|uid| !uid.is_empty()));
    }

    #[test]
    fn test_drain_on_empty_buffer() {
        let buffer = CommandBuffer::new();
        assert!(buffer.drain_all().is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_clear_reports_dropped_count() {
        let buffer = CommandBuffer::new();
        buffer.append(CommandKind::Channels {});
        buffer.append(CommandKind::Stats {});
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.clear(), 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_concurrent_append_and_drain_loses_nothing() {
        const WRITERS: usize = 8;
        const PER_WRITER: usize = 250;

        let buffer = Arc::new(CommandBuffer::new());
        let writers: Vec<_> = (0..WRITERS)
            .map(|w| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for i in 0..PER_WRITER {
                        buffer.append(presence(&format!("{}-{}", w, i)));
                    }
                })
            })
            .collect();

        let mut drained = Vec::new();
        while writers.iter().any(|h| !h.is_finished()) {
            drained.extend(buffer.drain_all());
        }
        for handle in writers {
            handle.join().unwrap();
        }
        drained.extend(buffer.drain_all());

        assert_eq!(drained.len(), WRITERS * PER_WRITER);
        let uids: HashSet<&str> = drained.iter().map(|c| c.uid()).collect();
        assert_eq!(uids.len(), WRITERS * PER_WRITER);
        assert!(buffer.is_empty());
    }
}
