//! Association checks for joined field references.
//!
//! Each check raises its own error kind so that call sites can tell an
//! undeclared association from an incomplete or unapplied one.

use quarry_core::utils::suggest;
use quarry_core::schema::AttributeType;
use quarry_core::{Error, Field, JoinConfig, JoinContext, Result};

use crate::CompileCtx;

pub struct JoinGuard<'a> {
    ctx: CompileCtx<'a>,
}

impl<'a> JoinGuard<'a> {
    pub fn new(ctx: CompileCtx<'a>) -> Self {
        Self { ctx }
    }

    /// The association is declared on the source collection.
    pub fn ensure_declared(&self, assoc: &str) -> Result<&'a JoinConfig> {
        let model = self.ctx.model;
        model.join(assoc).ok_or_else(|| Error::UnknownAssociation {
            collection: model.collection().to_owned(),
            association: assoc.to_owned(),
            suggestions: suggest(assoc, model.join_names()),
        })
    }

    /// Both join keys are present.
    pub fn ensure_complete(&self, assoc: &str, config: &JoinConfig) -> Result<()> {
        let present = |k: &Option<String>| k.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !present(&config.local_key) {
            return Err(Error::IncompleteJoin {
                association: assoc.to_owned(),
                missing: "local_key",
            });
        }
        if !present(&config.foreign_key) {
            return Err(Error::IncompleteJoin {
                association: assoc.to_owned(),
                missing: "foreign_key",
            });
        }
        if config.collection.trim().is_empty() {
            return Err(Error::IncompleteJoin {
                association: assoc.to_owned(),
                missing: "collection",
            });
        }
        Ok(())
    }

    /// `joins(assoc)` was applied before the reference.
    pub fn ensure_applied(&self, assoc: &str, applied: &[String], context: JoinContext) -> Result<()> {
        if applied.iter().any(|a| a == assoc) {
            return Ok(());
        }
        Err(Error::JoinNotApplied {
            association: assoc.to_owned(),
            context,
        })
    }

    /// The field exists on the target collection.
    ///
    /// Skipped when the target collection has no registered metadata.
    pub fn ensure_known_field(&self, assoc: &str, field: &str) -> Result<()> {
        let Some(target) = self.ctx.registry.join_target(self.ctx.model, assoc) else {
            return Ok(());
        };
        if !target.has_attributes() || target.knows_field(field) {
            return Ok(());
        }
        Err(Error::UnknownJoinedField {
            association: assoc.to_owned(),
            collection: target.collection().to_owned(),
            field: field.to_owned(),
            suggestions: suggest(field, target.attribute_names()),
        })
    }

    /// Declared, complete and applied.
    pub fn ensure_usable(
        &self,
        assoc: &str,
        applied: &[String],
        context: JoinContext,
    ) -> Result<&'a JoinConfig> {
        let config = self.ensure_declared(assoc)?;
        self.ensure_complete(assoc, config)?;
        self.ensure_applied(assoc, applied, context)?;
        Ok(config)
    }

    /// Fully validate a joined field reference.
    pub fn check_field(&self, field: &Field, applied: &[String], context: JoinContext) -> Result<()> {
        let Some(assoc) = field.assoc() else {
            return Ok(());
        };
        self.ensure_usable(assoc, applied, context)?;
        self.ensure_known_field(assoc, field.name())
    }

    /// The base field is declared, when attribute metadata is available.
    ///
    /// Names starting with `_` are backend virtual fields and always pass.
    pub fn ensure_known_base(&self, name: &str) -> Result<()> {
        let model = self.ctx.model;
        if name.starts_with('_') || !model.has_attributes() || model.knows_field(name) {
            return Ok(());
        }
        Err(Error::UnknownField {
            collection: model.collection().to_owned(),
            field: name.to_owned(),
            suggestions: suggest(name, model.attribute_names()),
        })
    }

    /// Resolve a dotted path (`name`, `assoc.name`, `object.key`) into a
    /// validated field reference.
    pub fn resolve(&self, path: &str, applied: &[String], context: JoinContext) -> Result<Field> {
        let path = path.trim();
        let Some((head, rest)) = path.split_once('.') else {
            self.ensure_known_base(path)?;
            return Field::base(path);
        };

        let model = self.ctx.model;
        if model.join(head).is_some() {
            if rest.contains('.') {
                return Err(Error::MultiHop {
                    path: path.to_owned(),
                });
            }
            let field = Field::joined(head, rest)?;
            self.check_field(&field, applied, context)?;
            return Ok(field);
        }

        let is_object = model
            .attribute(head)
            .is_some_and(|a| matches!(a.ty, AttributeType::Object | AttributeType::ObjectArray));
        if is_object || model.knows_field(path) || !model.has_attributes() {
            return Field::base(path);
        }
        Err(Error::UnknownAssociation {
            collection: model.collection().to_owned(),
            association: head.to_owned(),
            suggestions: suggest(head, model.join_names()),
        })
    }
}
