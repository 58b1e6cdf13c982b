//! Background rendering for the centre panel.
//!
//! Syntax highlighting and diffing large documents is too slow for the 30 FPS
//! draw loop, so a dedicated `std::thread` owns the syntect `SyntaxSet` and
//! `ThemeSet` and turns [`types::RenderRequest`]s into pre-styled lines.
pub mod types;
pub mod worker;
