/// What the reporter typed about the lost item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireRequest {
  pub title:       String,
  pub description: String,
}

impl AcquireRequest {
  pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
    Self {
      title:       title.into().trim().to_string(),
      description: description.into().trim().to_string(),
    }
  }

  /// Prompt sent to the generator tiers.
  pub fn generation_prompt(&self) -> String {
    format!(
      "High quality professional product photo of a {}, {}, studio lighting, highly \
       detailed, clean white background, 4k resolution",
      self.title, self.description
    )
  }

  /// Shorter prompt embedded in the direct-render URL.
  pub fn render_prompt(&self) -> String {
    format!("Product photo of a {}, isolated on white background", self.title)
  }
}
