//! Office Open XML (.docx) extraction.

pub mod docx;
