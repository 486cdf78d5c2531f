//! `expose_label`.

use crate::error::{MigrationError, Result};
use crate::transform::metadata::{validate_label_name, validate_separator};
use crate::transform::{Context, Noop, Transform, Transformation};

/// Copies a label found in the message or changes into the message,
/// optionally under a new name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposeLabel {
    name: String,
    new_name: String,
    separator: String,
    ignore_label_not_found: bool,
    all: bool,
    concat_separator: Option<String>,
}

impl ExposeLabel {
    /// `new_name` defaults to `name` and `separator` to `=`.
    ///
    /// `concat_separator` joins every value into one label and requires `all`.
    pub fn new(
        name: impl Into<String>,
        new_name: Option<String>,
        separator: Option<String>,
        ignore_label_not_found: bool,
        all: bool,
        concat_separator: Option<String>,
    ) -> Result<Self> {
        let name = name.into();
        let new_name = new_name.unwrap_or_else(|| name.clone());
        let separator = separator.unwrap_or_else(|| "=".to_string());
        validate_label_name("expose_label name", &name)?;
        validate_label_name("expose_label new_name", &new_name)?;
        validate_separator(&separator)?;
        if concat_separator.is_some() && !all {
            return Err(MigrationError::config(
                "expose_label: concat_separator requires all = true",
            ));
        }
        Ok(Self {
            name,
            new_name,
            separator,
            ignore_label_not_found,
            all,
            concat_separator,
        })
    }

    fn not_found(&self) -> Result<()> {
        if self.ignore_label_not_found {
            Ok(())
        } else {
            Err(MigrationError::apply(format!(
                "cannot find label {}",
                self.name
            )))
        }
    }

    fn expose_first(&self, ctx: &mut Context<'_>) -> Result<()> {
        let Some(value) = ctx.get_label(&self.name) else {
            return self.not_found();
        };
        if self.name == self.new_name {
            ctx.remove_label_with_value(&self.name, &value);
        }
        ctx.add_label(&self.new_name, &value, &self.separator);
        Ok(())
    }

    fn expose_all(&self, ctx: &mut Context<'_>) -> Result<()> {
        let values = ctx.get_all_labels(&self.name);
        if values.is_empty() {
            return self.not_found();
        }
        if self.name == self.new_name {
            ctx.remove_label(&self.name);
        }
        match &self.concat_separator {
            Some(joiner) => ctx.add_label(&self.new_name, &values.join(joiner), &self.separator),
            None => {
                for value in &values {
                    ctx.add_label(&self.new_name, value, &self.separator);
                }
            }
        }
        Ok(())
    }
}

impl Transform for ExposeLabel {
    fn apply(&self, ctx: &mut Context<'_>) -> Result<()> {
        if self.all {
            self.expose_all(ctx)
        } else {
            self.expose_first(ctx)
        }
    }

    fn reverse(&self) -> Transformation {
        Noop::reversing(self.clone().into()).into()
    }

    fn describe(&self) -> String {
        format!("Exposing label {} as {}", self.name, self.new_name)
    }
}
