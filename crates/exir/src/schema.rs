use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::error::Error;
use crate::value::{TypeRef, Value};

pub type KindId = u32;

/// Field of the output kinds materialized for output declarations.
const SUBJECT_FIELD: &str = "subject";

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: SmolStr,
    pub ty: TypeRef,
    pub default: Option<Value>,
}

/// Result type of an output declaration. `SelfType` resolves to the
/// declaring kind at registration time.
#[derive(Debug, Clone)]
pub enum OutputType {
    Kind(Kind),
    SelfType,
}

#[derive(Debug, Clone)]
struct OutputDecl {
    name: SmolStr,
    // `None` marks a SelfType declaration, resolved against the owner.
    result: Option<Kind>,
}

#[derive(Debug)]
struct KindData {
    id: KindId,
    name: SmolStr,
    parent: Option<Kind>,
    is_abstract: bool,
    // Ancestor fields first, in declaration order.
    fields: Vec<FieldDef>,
    // Self first, then parents to the root: handler dispatch walks this.
    ancestors: Vec<KindId>,
    output_decls: Vec<OutputDecl>,
}

/// An immutable node-kind descriptor shared by every node of the kind.
#[derive(Debug, Clone)]
pub struct Kind(Rc<KindData>);

impl Kind {
    pub fn id(&self) -> KindId {
        self.0.id
    }

    pub fn name(&self) -> &SmolStr {
        &self.0.name
    }

    pub fn parent(&self) -> Option<&Kind> {
        self.0.parent.as_ref()
    }

    pub fn is_abstract(&self) -> bool {
        self.0.is_abstract
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.0.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.0.fields.iter().position(|f| f.name == name)
    }

    /// Kind ids in specificity order, starting with this kind.
    pub fn ancestors(&self) -> &[KindId] {
        &self.0.ancestors
    }

    /// Walks the parent chain, starting with this kind.
    pub fn ancestor_kinds(&self) -> AncestorKinds {
        AncestorKinds {
            current: Some(self.clone()),
        }
    }

    pub fn is_a(&self, other: &Kind) -> bool {
        self.0.ancestors.contains(&other.id())
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Kind {}

impl std::hash::Hash for Kind {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

pub struct AncestorKinds {
    current: Option<Kind>,
}

impl Iterator for AncestorKinds {
    type Item = Kind;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        self.current = current.parent().cloned();
        Some(current)
    }
}

/// The kind registry. Kinds are declared once at startup through
/// [`KindBuilder`]; output kinds are materialized as part of registration.
#[derive(Debug, Default)]
pub struct Schema {
    kinds: Vec<Kind>,
    by_name: FxHashMap<SmolStr, Kind>,
    outputs: FxHashMap<(KindId, SmolStr), Kind>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(name: &str) -> KindBuilder {
        KindBuilder {
            name: SmolStr::new(name),
            parent: None,
            is_abstract: false,
            fields: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn kind(&self, name: &str) -> Option<&Kind> {
        self.by_name.get(name)
    }

    pub fn kinds(&self) -> &[Kind] {
        &self.kinds
    }

    /// The materialized output kind for `name` taken from `kind`, walking
    /// the ancestor chain so subtypes resolve inherited declarations.
    pub fn output_kind(&self, kind: &Kind, name: &str) -> Result<Kind, Error> {
        for ancestor in kind.ancestor_kinds() {
            if let Some(found) = self.outputs.get(&(ancestor.id(), SmolStr::new(name))) {
                return Ok(found.clone());
            }
        }
        Err(Error::UnknownOutput {
            kind: kind.name().clone(),
            output: SmolStr::new(name),
        })
    }

    fn intern(
        &mut self,
        name: SmolStr,
        parent: Option<Kind>,
        is_abstract: bool,
        own_fields: Vec<FieldDef>,
        output_decls: Vec<OutputDecl>,
    ) -> Result<Kind, Error> {
        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateKind(name));
        }

        let mut fields = parent
            .as_ref()
            .map(|p| p.fields().to_vec())
            .unwrap_or_default();
        for field in own_fields {
            if fields.iter().any(|f| f.name == field.name) {
                return Err(Error::FieldShadowsAncestor {
                    kind: name,
                    field: field.name,
                });
            }
            fields.push(field);
        }

        let id = self.kinds.len() as KindId;
        let mut ancestors = vec![id];
        if let Some(parent) = &parent {
            ancestors.extend_from_slice(parent.ancestors());
        }

        let kind = Kind(Rc::new(KindData {
            id,
            name: name.clone(),
            parent,
            is_abstract,
            fields,
            ancestors,
            output_decls,
        }));
        self.kinds.push(kind.clone());
        self.by_name.insert(name, kind.clone());
        Ok(kind)
    }

    /// Creates the derived node kind for one output declaration: a
    /// descendant of `parent` holding the declaring node as its `subject`.
    fn materialize_output(
        &mut self,
        owner: &Kind,
        output_name: &SmolStr,
        parent: Kind,
        is_abstract: bool,
        subject: Option<FieldDef>,
    ) -> Result<(), Error> {
        let name = SmolStr::new(format!("{}.{}", owner.name(), output_name));
        let own_fields = subject.into_iter().collect();
        let kind = self.intern(name, Some(parent), is_abstract, own_fields, Vec::new())?;
        self.outputs
            .insert((owner.id(), output_name.clone()), kind);
        Ok(())
    }

    fn register(&mut self, builder: KindBuilder) -> Result<Kind, Error> {
        let KindBuilder {
            name,
            parent,
            is_abstract,
            fields,
            outputs,
        } = builder;

        let output_decls = outputs
            .into_iter()
            .map(|(name, result)| OutputDecl {
                name,
                result: match result {
                    OutputType::Kind(kind) => Some(kind),
                    OutputType::SelfType => None,
                },
            })
            .collect::<Vec<_>>();

        let kind = self.intern(name, parent, is_abstract, fields, output_decls)?;

        // Output kinds declared here. A SelfType result is the declaring
        // kind itself.
        for decl in &kind.0.output_decls {
            let result = decl.result.clone().unwrap_or_else(|| kind.clone());
            let subject = FieldDef {
                name: SmolStr::new(SUBJECT_FIELD),
                ty: TypeRef::Kind(kind.clone()),
                default: None,
            };
            self.materialize_output(&kind, &decl.name, result, is_abstract, Some(subject))?;
        }

        // A concrete kind also specializes every output inherited from an
        // abstract ancestor, so outputs taken from different subtypes stay
        // distinct kinds that dispatch through the shared abstract one.
        if !kind.is_abstract() {
            let ancestors = kind.ancestor_kinds().skip(1).collect::<Vec<_>>();
            for ancestor in ancestors {
                for decl in &ancestor.0.output_decls {
                    if self.outputs.contains_key(&(kind.id(), decl.name.clone())) {
                        continue;
                    }
                    let shared = self
                        .outputs
                        .get(&(ancestor.id(), decl.name.clone()))
                        .cloned()
                        .ok_or_else(|| Error::UnknownOutput {
                            kind: ancestor.name().clone(),
                            output: decl.name.clone(),
                        })?;
                    self.materialize_output(&kind, &decl.name, shared, false, None)?;
                }
            }
        }

        Ok(kind)
    }
}

pub struct KindBuilder {
    name: SmolStr,
    parent: Option<Kind>,
    is_abstract: bool,
    fields: Vec<FieldDef>,
    outputs: Vec<(SmolStr, OutputType)>,
}

impl KindBuilder {
    pub fn extends(mut self, parent: &Kind) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn abstract_kind(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn field(mut self, name: &str, ty: TypeRef) -> Self {
        self.fields.push(FieldDef {
            name: SmolStr::new(name),
            ty,
            default: None,
        });
        self
    }

    pub fn field_with_default(mut self, name: &str, ty: TypeRef, default: impl Into<Value>) -> Self {
        self.fields.push(FieldDef {
            name: SmolStr::new(name),
            ty,
            default: Some(default.into()),
        });
        self
    }

    pub fn output(mut self, name: &str, result: OutputType) -> Self {
        self.outputs.push((SmolStr::new(name), result));
        self
    }

    pub fn register(self, schema: &mut Schema) -> Result<Kind, Error> {
        schema.register(self)
    }
}
