pub type Attribute = (String, Option<String>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Text(String),
}

impl Token {
    pub fn start_tag_name(&self) -> Option<&str> {
        match self {
            Token::StartTag { name, .. } => Some(name),
            _ => None,
        }
    }
}
