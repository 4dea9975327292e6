use poem_openapi::Object;
use serde::{Deserialize, Serialize};

/// Structured pedagogical analysis of one student's work in a lesson,
/// generated from the chat transcript and quiz results.
#[derive(Debug, Clone, PartialEq, Eq, Object, Serialize, Deserialize)]
pub struct ProgressAnalysis {
    /// What the student has mastered.
    pub strong_points: Vec<String>,
    /// Where the student has gaps.
    pub areas_for_improvement: Vec<String>,
    /// Actionable steps for the student.
    pub recommendations_for_student: Vec<String>,
    /// Suggestions for how the professor can help.
    pub recommendations_for_professor: Vec<String>,
}
