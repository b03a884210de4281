pub mod acquisition;
pub mod assistance;
pub mod nearby;
pub mod session;
pub mod view;
