/*!

Types/type aliases that abstract over the implementing backing type.

# Background and Motivation

A motivating example is the `IString` type, an interned string type. A number of external crates could provide
this functionality. This module redirects to whatever chosen implementation we want. To use the
[`string_cache` crate](https://crates.io/crates/string_cache), we just define `IString` as an alias for
`string_cache::DefaultAtom`:

```ignore
pub use string_cache::DefaultAtom as IString;
```

For infrastructure with very different backing implementations, we define an abstraction layer over the
implementation instead of a type alias. The `log` module, for example, is a thin wrapper over `tracing` so
that the rest of the workspace depends on `redex_abs::log`, not on `tracing` directly.

*/

mod memory;

pub mod hash;
pub mod log;

// Generic memory utilities
pub use memory::{as_bytes, as_bytes_mut};

// Interned string. `DefaultAtom` gives a global cache usable across threads.
pub use string_cache::DefaultAtom as IString;
