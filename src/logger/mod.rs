//! Activity logging: append-only JSONL for the portal's scan/validation events.

pub mod jsonl;
