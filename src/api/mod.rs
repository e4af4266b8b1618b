// Serialisable views of call trees for other tools.

pub mod dto;

pub use dto::{CallTreeDto, OriginDto, SelectedTreeDto, SelectionDto};
