/// Hands out command tags `A0000`, `A0001`, ... for one connection.
#[derive(Debug, Default)]
pub struct TagGenerator {
    issued: u32,
}

impl TagGenerator {
    /// The next unused tag. Wraps after `u32::MAX` tags.
    pub fn next_tag(&mut self) -> String {
        let tag = format!("A{:04}", self.issued);
        self.issued = self.issued.wrapping_add(1);
        tag
    }
}
