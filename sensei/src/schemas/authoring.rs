use poem_openapi::Object;

use super::questions::{Slide, TestType};

#[derive(Debug, Clone, Object)]
pub struct StudyText {
    /// The current study text of the lesson.
    pub text: String,
}

#[derive(Debug, Clone, Object)]
pub struct RefineStudyTextRequest {
    /// The professor's editing instruction, e.g. "simplify the second
    /// section".
    #[oai(validator(min_length = 1, max_length = 4096))]
    pub instruction: String,
}

#[derive(Debug, Clone, Object)]
pub struct GenerateQuizRequest {
    /// The number of questions to generate.
    #[oai(validator(minimum(value = "1"), maximum(value = "10")))]
    pub count: u8,
    /// Additional instructions for the model, e.g. "focus on definitions".
    #[oai(validator(max_length = 2048), default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Object)]
pub struct GenerateFinalTestRequest {
    /// The number of questions to generate.
    #[oai(validator(minimum(value = "5"), maximum(value = "20")))]
    pub count: u8,
    /// The kind of questions to generate.
    #[oai(rename = "type")]
    pub ty: TestType,
    /// Free-form difficulty tag embedded into the prompt, e.g. "lehká".
    #[oai(validator(min_length = 1, max_length = 64))]
    pub difficulty: String,
}

#[derive(Debug, Clone, Object)]
pub struct GeneratePresentationRequest {
    /// The number of slides to generate.
    #[oai(validator(minimum(value = "3"), maximum(value = "15")))]
    pub slide_count: u8,
    /// Theme color for the rendered slides.
    #[oai(validator(pattern = r"^#[0-9a-fA-F]{6}$"))]
    pub theme_color: String,
}

/// A generated presentation outline. The paginated document itself is
/// rendered client-side, one page per slide.
#[derive(Debug, Clone, Object)]
pub struct Presentation {
    pub slides: Vec<Slide>,
    /// The requested theme color, echoed back for the renderer.
    pub theme_color: String,
}
