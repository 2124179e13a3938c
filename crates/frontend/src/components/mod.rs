pub mod choropleth;
pub mod info_panel;
pub mod legend;
pub mod place_box;
pub mod share_panel;
pub mod tools;
