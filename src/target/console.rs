//! Console target writing one line per event to stdout or stderr.

use std::any::Any;
use std::io::{self, Write};
use std::sync::Arc;

use crate::config::properties::{parse_bool, PropertyError, PropertySetters};
use crate::config::ConfigError;
use crate::layout::Template;
use crate::target::{Target, TargetBuilder, TargetError};

#[derive(Debug)]
pub struct ConsoleTarget {
    name: String,
    layout: Template,
    use_stderr: bool,
}

impl ConsoleTarget {
    pub fn new(name: impl Into<String>, layout: Template, use_stderr: bool) -> Self {
        Self {
            name: name.into(),
            layout,
            use_stderr,
        }
    }

    pub fn uses_stderr(&self) -> bool {
        self.use_stderr
    }
}

impl Target for ConsoleTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn layout(&self) -> &Template {
        &self.layout
    }

    fn emit(&self, rendered: &str) -> Result<(), TargetError> {
        if self.use_stderr {
            writeln!(io::stderr().lock(), "{rendered}")?;
        } else {
            writeln!(io::stdout().lock(), "{rendered}")?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), TargetError> {
        if self.use_stderr {
            io::stderr().flush()?;
        } else {
            io::stdout().flush()?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Default)]
pub struct ConsoleTargetBuilder {
    layout: Template,
    use_stderr: bool,
}

impl ConsoleTargetBuilder {
    const SETTERS: PropertySetters<Self> = PropertySetters::new(
        "target type 'console'",
        &[("layout", Self::set_layout), ("error", Self::set_error)],
    );

    fn set_layout(&mut self, value: &str) -> Result<(), PropertyError> {
        self.layout = Template::compile(value)?;
        Ok(())
    }

    fn set_error(&mut self, value: &str) -> Result<(), PropertyError> {
        self.use_stderr = parse_bool(value)?;
        Ok(())
    }
}

impl TargetBuilder for ConsoleTargetBuilder {
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        Self::SETTERS.apply(self, name, value)
    }

    fn build(self: Box<Self>, name: String) -> Result<Arc<dyn Target>, ConfigError> {
        Ok(Arc::new(ConsoleTarget::new(name, self.layout, self.use_stderr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_selects_stderr() {
        let mut builder = Box::<ConsoleTargetBuilder>::default();
        builder.set_property("Error", "true").unwrap();
        let target = builder.build("console".into()).unwrap();
        let console = target.as_any().downcast_ref::<ConsoleTarget>().unwrap();
        assert!(console.uses_stderr());
        assert!(target.emit("to stderr").is_ok());
    }
}
