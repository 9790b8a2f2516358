/// What the enclosing chain should do after a statement ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Next,
    /// A `print` ran; nothing else in the program executes.
    Halt,
}
