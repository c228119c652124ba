use crate::{util::parameter_base, write_integer};

/// Clause currently being rendered.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    Select,
    From,
    Join,
    Where,
    GroupBy,
    OrderBy,
    Insert,
    Update,
    Delete,
    Introspection,
}

/// Rendering state threaded through every [`Dialect`](crate::Dialect) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    /// Suffix of the next generated parameter name.
    pub counter: u32,
    pub fragment: Fragment,
    /// Prefix columns with the table alias.
    pub qualify_columns: bool,
    /// Quote identifiers that are reserved words.
    pub escape_reserved: bool,
}

impl Context {
    pub fn new(fragment: Fragment, qualify_columns: bool, escape_reserved: bool) -> Self {
        Self {
            counter: 0,
            fragment,
            qualify_columns,
            escape_reserved,
        }
    }

    pub fn update_from(&mut self, context: &Context) {
        self.counter = context.counter;
    }

    /// Fresh parameter name derived from `base`, `status` becomes `status_0`, then `status_1`.
    pub fn parameter_name(&mut self, base: &str) -> String {
        let mut name = String::with_capacity(base.len() + 3);
        name.push_str(&parameter_base(base));
        name.push('_');
        write_integer!(name, self.counter);
        self.counter += 1;
        name
    }

    pub fn switch_fragment<'s>(&'s mut self, fragment: Fragment) -> ContextUpdater<'s> {
        ContextUpdater {
            current: Context { fragment, ..*self },
            previous: self,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(Fragment::None, false, false)
    }
}

/// Temporary context for a nested fragment, the parameter counter is carried back on drop.
pub struct ContextUpdater<'a> {
    pub current: Context,
    pub previous: &'a mut Context,
}

impl<'a> Drop for ContextUpdater<'a> {
    fn drop(&mut self) {
        self.previous.counter = self.current.counter;
    }
}
