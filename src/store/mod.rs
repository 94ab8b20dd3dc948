//! Data store modules for Supabase integration

pub mod catalog;
pub mod contacts;
pub mod logs;
pub mod profiles;
pub mod saved;
pub mod supabase;

pub use catalog::CatalogStore;
pub use contacts::ContactStore;
pub use logs::ErrorLogger;
pub use profiles::ProfileStore;
pub use saved::SavedItemStore;
pub use supabase::SupabaseClient;
