use poem_openapi::Object;

/// One supported output format of the QR endpoint.
#[derive(Object, Debug, Clone)]
pub struct FormatInfo {
    /// Value accepted by the `format` parameter
    pub name: String,

    /// Content type the response actually carries
    pub content_type: String,

    /// Whether the output is a vector document
    pub vector: bool,
}
