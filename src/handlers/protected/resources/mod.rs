// handlers/protected/resources/mod.rs - /resources endpoints

pub mod create;
pub mod delete;
pub mod list;
pub mod show;
pub mod update;

pub use create::resource_create;
pub use delete::resource_delete;
pub use list::resource_list;
pub use show::resource_show;
pub use update::resource_update;
