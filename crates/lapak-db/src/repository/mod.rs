//! # Repository Module
//!
//! Database repository implementations for the purchase service.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PurchaseService                                                        │
//! │       │                                                                 │
//! │       │  db.purchases().create_full(&record)                           │
//! │       ▼                                                                 │
//! │  PurchaseRepository                                                    │
//! │  ├── create_full(&self, record)        one transaction, four tables    │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── load_record(&self, purchase)                                      │
//! │  ├── list_by_user(&self, user, page)                                   │
//! │  └── update_payment_proof(&self, id, owner, file_ids)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`purchase::PurchaseRepository`] - Purchase records and their snapshots

pub mod purchase;
