use utoipa::OpenApi;

use crate::model::request::RenderRequestJsonBody;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "html2png",
        description = "Render HTML, or a simple title card, to a PNG image."
    ),
    paths(super::render::render),
    components(schemas(RenderRequestJsonBody)),
    tags((name = "Render", description = "HTML to PNG rendering"))
)]
pub struct ApiDoc;
