pub mod components;
pub mod editor;
pub mod layout;
pub mod theme;
