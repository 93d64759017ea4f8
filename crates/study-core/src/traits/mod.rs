//! Ports - interfaces the domain requires from infrastructure

mod store;

pub use store::{
    CollectionSnapshot, Document, DocumentSnapshot, DocumentStore, StoreError, StoreResult,
};
