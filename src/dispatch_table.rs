/*
 * The message map: an ordered list of handler entries matched against incoming
 * events. Entries are collected by `DispatchTableBuilder`, which rejects duplicate
 * patterns as soon as they are registered, and frozen into a read-only
 * `DispatchTable` by `build()`. Lookups never mutate the table.
 *
 * The table is generic over the handler reference so it can store plain function
 * pointers for a concrete window type as well as any other `Copy` token.
 */
use crate::error::{DispatchError, Result};
use crate::types::{CommandId, Event, EventCategory, SubCodeMatch};

#[derive(Debug, Clone)]
pub(crate) struct HandlerEntry<F> {
    category: EventCategory,
    code: u32,
    sub_code: SubCodeMatch,
    handler: F,
}

impl<F> HandlerEntry<F> {
    fn has_pattern(&self, category: EventCategory, code: u32, sub_code: SubCodeMatch) -> bool {
        self.category == category && self.code == code && self.sub_code == sub_code
    }
}

#[derive(Debug)]
pub struct DispatchTableBuilder<F> {
    entries: Vec<HandlerEntry<F>>,
}

impl<F> Default for DispatchTableBuilder<F> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<F> DispatchTableBuilder<F> {
    /*
     * Appends one entry. Fails with `DuplicateHandler` if an entry with the identical
     * (category, code, sub-code) pattern exists; an exact sub-code and a wildcard for
     * the same pair are distinct patterns and may coexist.
     */
    pub fn register(
        &mut self,
        category: EventCategory,
        code: u32,
        sub_code: SubCodeMatch,
        handler: F,
    ) -> Result<&mut Self> {
        if self
            .entries
            .iter()
            .any(|entry| entry.has_pattern(category, code, sub_code))
        {
            log::error!(
                "DispatchTable: duplicate handler for {category:?} code 0x{code:04X} sub-code {sub_code:?}"
            );
            return Err(DispatchError::DuplicateHandler {
                category,
                code,
                sub_code,
            });
        }
        self.entries.push(HandlerEntry {
            category,
            code,
            sub_code,
            handler,
        });
        Ok(self)
    }

    pub fn build(self) -> DispatchTable<F> {
        log::debug!(
            "DispatchTable: built with {} handler entries.",
            self.entries.len()
        );
        DispatchTable {
            entries: self.entries,
        }
    }
}

#[derive(Debug)]
pub struct DispatchTable<F> {
    entries: Vec<HandlerEntry<F>>,
}

impl<F> DispatchTable<F> {
    pub fn builder() -> DispatchTableBuilder<F> {
        DispatchTableBuilder::default()
    }

    /*
     * Finds the handler for `event`. Category and code must match exactly. Among the
     * candidates, an entry whose sub-code equals the event's command id wins over a
     * wildcard entry regardless of registration order. Returns `None` when the event
     * is unhandled.
     */
    pub fn lookup(&self, event: &Event) -> Option<&F> {
        let candidates = self
            .entries
            .iter()
            .filter(|entry| entry.category == event.category && entry.code == event.code);

        let exact_id = event.sub_code;
        let mut wildcard: Option<&HandlerEntry<F>> = None;
        for entry in candidates {
            match entry.sub_code {
                SubCodeMatch::Exact(id) if Some(id) == exact_id => return Some(&entry.handler),
                SubCodeMatch::Exact(_) => {}
                SubCodeMatch::Any => {
                    if wildcard.is_none() {
                        wildcard = Some(entry);
                    }
                }
            }
        }
        wildcard.map(|entry| &entry.handler)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an exact entry is registered for `command_id` on `code`.
    pub fn handles_command(&self, code: u32, command_id: CommandId) -> bool {
        self.entries.iter().any(|entry| {
            entry.has_pattern(
                EventCategory::Command,
                code,
                SubCodeMatch::Exact(command_id),
            )
        })
    }
}
