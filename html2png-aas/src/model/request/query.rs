use serde::Deserialize;
use utoipa::IntoParams;

///  The options are:
///  - `?width=<width>`: set the width of the image
///  - `?height=<height>`: set the height of the image
///  - `?title=<title>`: set the title of the fallback title card
///
/// Dimensions are kept as strings here; invalid values are ignored while
/// resolving the request rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RenderRequestQueryParams {
    /// Image width in pixels (defaults to 1200).
    #[param(value_type = Option<u32>)]
    pub width: Option<String>,
    /// Image height in pixels (defaults to 630).
    #[param(value_type = Option<u32>)]
    pub height: Option<String>,
    /// Title shown on the title card when no HTML is supplied.
    pub title: Option<String>,
}
