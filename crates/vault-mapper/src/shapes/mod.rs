//! One shape per archivable object type.

mod collection;
mod data_file;
mod data_item;
mod metadata_file;
mod registry_entry;

pub use collection::CollectionShape;
pub use data_file::DataFileShape;
pub use data_item::DataItemShape;
pub use metadata_file::MetadataFileShape;
pub use registry_entry::RegistryEntryShape;
