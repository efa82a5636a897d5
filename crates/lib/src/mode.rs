//! Run mode, chosen once from the prompt words on the command line.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Terminal UI conversation.
    Interactive,
    /// Ask once, print the answer, exit. Holds the space-joined prompt.
    OneShot(String),
}

impl Mode {
    /// No words ⇒ interactive; any words ⇒ one-shot with the words joined by spaces.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        if args.is_empty() {
            Mode::Interactive
        } else {
            let words: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
            Mode::OneShot(words.join(" "))
        }
    }
}
