/*!

There are different text representations possible for terms, depending on the context: a `Display`-style
rendering, a debug rendering with extra structure visible, and a rendering that attempts to produce valid
input syntax. This module provides a unified API for formatting across the crate.

The trait that types which can be formatted implement is `Formattable`. It works similarly to the standard
library's `Display` trait. Unfortunately `Display` can't be extended with formatting for externally defined
types, and `Display`/`Debug` can't both be implemented generically for `T: Formattable` without specialization,
so we provide a macro that generates both impls in terms of `Formattable::repr`:

```ignore
struct MyStruct;
impl Formattable for MyStruct {
  fn repr(&self, f: &mut dyn std::fmt::Write, style: FormatStyle) -> std::fmt::Result {
    write!(f, "MyStruct<{}>", style)
  }
}
impl_display_debug_for_formattable!(MyStruct);
```

*/

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum FormatStyle {
  #[default]
  Default, // Use the default formatting
  Simple,  // Use a simplified, condensed formatting
  Input,   // Format as a valid input expression, if possible
  Debug,   // Format with extra debugging information
}

pub trait Formattable {
  /// Writes a text representation of `self` according to the given `FormatStyle`.
  fn repr(&self, out: &mut dyn std::fmt::Write, style: FormatStyle) -> std::fmt::Result;
}

#[macro_export]
macro_rules! impl_display_debug_for_formattable {
    ($t:ty) => {
        impl std::fmt::Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                <$t as $crate::Formattable>::repr(self, f, $crate::FormatStyle::Default)
            }
        }

        impl std::fmt::Debug for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                <$t as $crate::Formattable>::repr(self, f, $crate::FormatStyle::Debug)
            }
        }
    };
}
pub use impl_display_debug_for_formattable;
