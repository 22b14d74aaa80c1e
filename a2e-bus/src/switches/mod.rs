//! Soft-switch controllers: the components that translate `$C0xx`-`$C07x`
//! writes and reads into bus-layer changes, routing-table pushes, or plain
//! latched state (spec §4.4).

pub mod aux_memory;
pub mod character;
pub mod keyboard;
pub mod language_card;
pub mod video_mode;

pub use aux_memory::AuxMemoryController;
pub use character::CharacterController;
pub use keyboard::KeyboardController;
pub use language_card::LanguageCardController;
pub use video_mode::VideoModeController;
