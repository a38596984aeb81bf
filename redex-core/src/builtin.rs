/*!

Built-in functions. A `Builtin` term is applied like any other callable; [`crate::reducer::apply`] evaluates
its strict argument positions first, short-circuiting on `Signal`, then dispatches on the runtime values.

*/

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
  Add,
  Subtract,
  Multiply,
  Divide,
  Modulo,
  Negate,
  Not,
  And,
  Or,
  Equal,
  NotEqual,
  LessThan,
  LessThanOrEqual,
  GreaterThan,
  GreaterThanOrEqual,
  If,
  Length,
  Get,
  Has,
  Keys,
  Values,
  Concat,
}

impl Builtin {
  /// Number of formal arguments.
  pub fn arity(self) -> u32 {
    use Builtin::*;
    match self {
      Negate | Not | Length | Keys | Values => 1,
      If => 3,
      _ => 2,
    }
  }

  /// Whether the argument at `position` is a strict (eagerly evaluated) position. Every builtin here is
  /// all-strict except `If`, whose branches must stay lazy so the untaken one is never forced.
  pub fn arg_is_strict(self, position: usize) -> bool {
    match self {
      Builtin::If => position == 0,
      _ => true,
    }
  }

  fn name(self) -> &'static str {
    match self {
      Builtin::Add => "Add",
      Builtin::Subtract => "Subtract",
      Builtin::Multiply => "Multiply",
      Builtin::Divide => "Divide",
      Builtin::Modulo => "Modulo",
      Builtin::Negate => "Negate",
      Builtin::Not => "Not",
      Builtin::And => "And",
      Builtin::Or => "Or",
      Builtin::Equal => "Equal",
      Builtin::NotEqual => "NotEqual",
      Builtin::LessThan => "LessThan",
      Builtin::LessThanOrEqual => "LessThanOrEqual",
      Builtin::GreaterThan => "GreaterThan",
      Builtin::GreaterThanOrEqual => "GreaterThanOrEqual",
      Builtin::If => "If",
      Builtin::Length => "Length",
      Builtin::Get => "Get",
      Builtin::Has => "Has",
      Builtin::Keys => "Keys",
      Builtin::Values => "Values",
      Builtin::Concat => "Concat",
    }
  }
}

impl crate::format::Formattable for Builtin {
  fn repr(&self, out: &mut dyn std::fmt::Write, style: crate::format::FormatStyle) -> std::fmt::Result {
    match style {
      crate::format::FormatStyle::Debug => write!(out, "Builtin::{}", self.name()),
      _ => write!(out, "{}", self.name()),
    }
  }
}

crate::impl_display_debug_for_formattable!(Builtin);
