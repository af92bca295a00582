//! Interface block and struct schemas.
//!
//! A schema is an ordered member list resolved once, either from a
//! `class Name(Base): ...` definition or through the builder methods. Member
//! order is declaration order and is never re-sorted.

use crate::error::{CompileError, CompileResult};
use crate::source::ast::{ClassDef, Expr, Literal, Stmt};
use crate::types::{resolve_marker, ArrayLength, Qualifier, TypeLookup, TypeMarker};
use crate::util::snake_case;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlockKind {
    Uniform,
    Attribute,
    Varying,
    FragmentOutput,
}

impl BlockKind {
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Uniform => "uniform",
            BlockKind::Attribute => "attribute",
            BlockKind::Varying => "interface",
            BlockKind::FragmentOutput => "fragment output",
        }
    }
}

/// What a schema base class declares.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SchemaKind {
    Block(BlockKind),
    Struct,
}

impl SchemaKind {
    pub fn from_base(name: &str) -> Option<SchemaKind> {
        Some(match name {
            "UniformBlock" => SchemaKind::Block(BlockKind::Uniform),
            "AttributeBlock" => SchemaKind::Block(BlockKind::Attribute),
            "ShaderInterface" => SchemaKind::Block(BlockKind::Varying),
            "FragmentShaderOutputBlock" => SchemaKind::Block(BlockKind::FragmentOutput),
            "GlslStruct" => SchemaKind::Struct,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InterfaceMember {
    pub name: String,
    pub marker: TypeMarker,
    pub qualifier: Option<Qualifier>,
}

impl InterfaceMember {
    fn declare(&self) -> String {
        match self.qualifier {
            Some(qualifier) => format!(
                "{} {};",
                qualifier.keyword(),
                self.marker.declare(&self.name)
            ),
            None => format!("{};", self.marker.declare(&self.name)),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InterfaceBlock {
    pub name: String,
    pub kind: BlockKind,
    pub members: Vec<InterfaceMember>,
}

fn location(location: usize) -> String {
    format!("layout(location={})", location)
}

impl InterfaceBlock {
    pub fn new(name: impl Into<String>, kind: BlockKind) -> Self {
        InterfaceBlock {
            name: name.into(),
            kind,
            members: vec![],
        }
    }

    /// Appends a member; `gl_` members are built-ins and are skipped.
    pub fn member(self, name: impl Into<String>, marker: TypeMarker) -> Self {
        self.push_member(name.into(), marker, None)
    }

    pub fn qualified_member(
        self,
        name: impl Into<String>,
        marker: TypeMarker,
        qualifier: Qualifier,
    ) -> Self {
        self.push_member(name.into(), marker, Some(qualifier))
    }

    fn push_member(
        mut self,
        name: String,
        marker: TypeMarker,
        qualifier: Option<Qualifier>,
    ) -> Self {
        if !name.starts_with("gl_") {
            self.members.push(InterfaceMember {
                name,
                marker,
                qualifier,
            });
        }
        self
    }

    /// Instance name used when the block is written as a stage output.
    pub fn instance_name(&self) -> String {
        snake_case(&self.name)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Structs referenced by members, in member order.
    pub fn referenced_types(&self) -> impl Iterator<Item = &str> {
        self.members.iter().filter_map(|member| match member.marker.base() {
            TypeMarker::Named(name) => Some(name.as_str()),
            _ => None,
        })
    }

    fn reject_array(&self, array: Option<ArrayLength>) -> CompileResult<()> {
        if array.is_some() {
            return Err(CompileError::malformed(format!(
                "{} block '{}' cannot be declared as an array",
                self.kind.name(),
                self.name
            )));
        }
        Ok(())
    }

    fn aggregate(
        &self,
        direction: &str,
        instance: &str,
        array: Option<ArrayLength>,
    ) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.members.len() + 2);
        lines.push(format!("{} {} {{", direction, self.name));
        for member in &self.members {
            lines.push(format!("    {}", member.declare()));
        }
        let suffix = array.map(|length| length.to_string()).unwrap_or_default();
        lines.push(format!("}} {}{};", instance, suffix));
        lines
    }

    /// Declaration lines for the block as a stage input bound to
    /// `instance`. Empty blocks declare nothing.
    pub fn declare_input(
        &self,
        instance: &str,
        array: Option<ArrayLength>,
    ) -> CompileResult<Vec<String>> {
        if self.is_empty() {
            return Ok(vec![]);
        }

        match self.kind {
            BlockKind::Uniform => {
                self.reject_array(array)?;
                Ok(self
                    .members
                    .iter()
                    .map(|member| format!("uniform {};", member.marker.declare(&member.name)))
                    .collect())
            }
            BlockKind::Attribute => {
                self.reject_array(array)?;
                Ok(self
                    .members
                    .iter()
                    .enumerate()
                    .map(|(index, member)| match member.qualifier {
                        Some(qualifier) => format!(
                            "{} {} in {};",
                            location(index),
                            qualifier.keyword(),
                            member.marker.declare(&member.name)
                        ),
                        None => format!(
                            "{} in {};",
                            location(index),
                            member.marker.declare(&member.name)
                        ),
                    })
                    .collect())
            }
            BlockKind::Varying => Ok(self.aggregate("in", instance, array)),
            BlockKind::FragmentOutput => Err(CompileError::malformed(format!(
                "fragment output block '{}' cannot be used as an input",
                self.name
            ))),
        }
    }

    /// Declaration lines for the block as the stage output.
    pub fn declare_output(&self, array: Option<ArrayLength>) -> CompileResult<Vec<String>> {
        if self.is_empty() {
            return Ok(vec![]);
        }

        match self.kind {
            BlockKind::Varying => Ok(self.aggregate("out", &self.instance_name(), array)),
            BlockKind::FragmentOutput => {
                self.reject_array(array)?;
                Ok(self
                    .members
                    .iter()
                    .enumerate()
                    .map(|(index, member)| match member.qualifier {
                        Some(qualifier) => format!(
                            "{} {} out {};",
                            qualifier.keyword(),
                            location(index),
                            member.marker.declare(&member.name)
                        ),
                        None => format!(
                            "{} out {};",
                            location(index),
                            member.marker.declare(&member.name)
                        ),
                    })
                    .collect())
            }
            BlockKind::Uniform | BlockKind::Attribute => Err(CompileError::malformed(format!(
                "{} block '{}' cannot be used as an output",
                self.kind.name(),
                self.name
            ))),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StructMember {
    pub name: String,
    pub marker: TypeMarker,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub members: Vec<StructMember>,
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        StructDef {
            name: name.into(),
            members: vec![],
        }
    }

    /// Appends a member; `_` members are private and skipped.
    pub fn member(mut self, name: impl Into<String>, marker: TypeMarker) -> Self {
        let name = name.into();
        if !name.starts_with('_') {
            self.members.push(StructMember { name, marker });
        }
        self
    }

    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|member| member.name == name)
    }

    pub fn referenced_types(&self) -> impl Iterator<Item = &str> {
        self.members.iter().filter_map(|member| match member.marker.base() {
            TypeMarker::Named(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn declare(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.members.len() + 2);
        lines.push(format!("struct {} {{", self.name));
        for member in &self.members {
            lines.push(format!("    {};", member.marker.declare(&member.name)));
        }
        lines.push("};".to_string());
        lines
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Schema {
    Block(InterfaceBlock),
    Struct(StructDef),
}

impl Schema {
    pub fn name(&self) -> &str {
        match self {
            Schema::Block(block) => &block.name,
            Schema::Struct(def) => &def.name,
        }
    }
}

/// The schema kind a class declares through its base, if any.
pub fn class_kind(class: &ClassDef) -> Option<SchemaKind> {
    class.bases.iter().find_map(|base| match base {
        Expr::Name(name) => SchemaKind::from_base(name),
        Expr::Attribute { attr, .. } => SchemaKind::from_base(attr),
        _ => None,
    })
}

struct MemberDecl {
    name: String,
    marker: TypeMarker,
    qualifier: Option<Qualifier>,
}

fn member_target(target: &Expr, class: &str) -> CompileResult<String> {
    target.as_name().map(str::to_string).ok_or_else(|| {
        CompileError::malformed(format!("member of '{}' must be a plain name", class))
    })
}

fn constructor_member(
    name: String,
    value: &Expr,
    class: &str,
    lookup: &dyn TypeLookup,
) -> CompileResult<MemberDecl> {
    let (func, args, keywords) = match value {
        Expr::Call {
            func,
            args,
            keywords,
        } => (func, args, keywords),
        _ => {
            return Err(CompileError::malformed(format!(
                "member '{}.{}' is not a constructor",
                class, name
            )))
        }
    };

    if !keywords.is_empty() {
        return Err(CompileError::malformed(format!(
            "member '{}.{}' takes no keyword arguments",
            class, name
        )));
    }

    let marker = resolve_marker(func, lookup)?;
    let qualifier = match args.as_slice() {
        [] => None,
        [Expr::Name(qualifier)] => match Qualifier::from_name(qualifier) {
            Some(qualifier) if qualifier.is_interpolation() => Some(qualifier),
            Some(_) => {
                return Err(CompileError::malformed(format!(
                    "'{}' is not an interpolation qualifier",
                    qualifier
                )))
            }
            None => return Err(CompileError::UnresolvedType(qualifier.clone())),
        },
        _ => {
            return Err(CompileError::malformed(format!(
                "member '{}.{}' accepts a single interpolation qualifier only",
                class, name
            )))
        }
    };

    Ok(MemberDecl {
        name,
        marker,
        qualifier,
    })
}

fn class_members(class: &ClassDef, lookup: &dyn TypeLookup) -> CompileResult<Vec<MemberDecl>> {
    let mut members = Vec::with_capacity(class.body.len());
    for stmt in &class.body {
        match stmt {
            Stmt::Pass | Stmt::Expr(Expr::Literal(Literal::Str(_))) => continue,
            Stmt::Assign { targets, value, .. } => {
                if targets.len() != 1 {
                    return Err(CompileError::malformed(format!(
                        "multiple assignment targets in '{}'",
                        class.name
                    )));
                }
                let name = member_target(&targets[0], &class.name)?;
                if name.starts_with("gl_") {
                    continue;
                }
                members.push(constructor_member(name, value, &class.name, lookup)?);
            }
            Stmt::AnnAssign {
                target,
                annotation,
                value,
            } => {
                let name = member_target(target, &class.name)?;
                if name.starts_with("gl_") {
                    continue;
                }
                match value {
                    Some(value) => {
                        members.push(constructor_member(name, value, &class.name, lookup)?)
                    }
                    None => members.push(MemberDecl {
                        name,
                        marker: resolve_marker(annotation, lookup)?,
                        qualifier: None,
                    }),
                }
            }
            _ => {
                return Err(CompileError::malformed(format!(
                    "'{}' may only contain member declarations",
                    class.name
                )))
            }
        }
    }
    Ok(members)
}

/// Resolves a schema class into a block or struct.
pub fn resolve_class(class: &ClassDef, lookup: &dyn TypeLookup) -> CompileResult<Schema> {
    let kind = class_kind(class).ok_or_else(|| {
        CompileError::malformed(format!("'{}' does not derive from a schema base", class.name))
    })?;
    let members = class_members(class, lookup)?;

    log::debug!("resolved schema '{}' with {} members", class.name, members.len());

    Ok(match kind {
        SchemaKind::Block(kind) => Schema::Block(InterfaceBlock {
            name: class.name.clone(),
            kind,
            members: members
                .into_iter()
                .map(|member| InterfaceMember {
                    name: member.name,
                    marker: member.marker,
                    qualifier: member.qualifier,
                })
                .collect(),
        }),
        SchemaKind::Struct => {
            let mut def = StructDef::new(class.name.clone());
            for member in members {
                if member.qualifier.is_some() {
                    return Err(CompileError::malformed(format!(
                        "struct member '{}.{}' cannot be qualified",
                        class.name, member.name
                    )));
                }
                def = def.member(member.name, member.marker);
            }
            Schema::Struct(def)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse;
    use std::collections::HashSet;

    fn class(source: &str) -> ClassDef {
        match parse(source).unwrap().remove(0) {
            Stmt::ClassDef(class) => class,
            other => panic!("expected class, got {:?}", other),
        }
    }

    fn resolve(source: &str) -> CompileResult<Schema> {
        let mut table = HashSet::new();
        table.insert("Material".to_string());
        resolve_class(&class(source), &table)
    }

    fn block(source: &str) -> InterfaceBlock {
        match resolve(source).unwrap() {
            Schema::Block(block) => block,
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn declares_uniforms_individually() {
        let block =
            block("class Globals(UniformBlock):\n    u_time = float()\n    u_matrix = mat4()\n");
        assert_eq!(
            block.declare_input("globals", None).unwrap(),
            vec!["uniform float u_time;", "uniform mat4 u_matrix;"]
        );
    }

    #[test]
    fn numbers_attribute_locations_in_order() {
        let block = block(
            "class Attrs(AttributeBlock):\n    position = vec3()\n    normal = vec3()\n    uv = vec2(flat)\n",
        );
        assert_eq!(
            block.declare_input("attrs", None).unwrap(),
            vec![
                "layout(location=0) in vec3 position;",
                "layout(location=1) in vec3 normal;",
                "layout(location=2) flat in vec2 uv;",
            ]
        );
    }

    #[test]
    fn aggregates_varyings_and_skips_builtins() {
        let block = block(
            "class VsOut(ShaderInterface):\n    \"\"\"doc\"\"\"\n    gl_position = vec4()\n    color = vec4(noperspective)\n",
        );
        assert_eq!(
            block.declare_output(None).unwrap(),
            vec!["out VsOut {", "    noperspective vec4 color;", "} vs_out;"]
        );
        assert_eq!(
            block.declare_input("vs_out", Some(ArrayLength::Unsized)).unwrap(),
            vec!["in VsOut {", "    noperspective vec4 color;", "} vs_out[];"]
        );
    }

    #[test]
    fn fragment_outputs_put_qualifier_first() {
        let block =
            block("class FsOut(FragmentShaderOutputBlock):\n    color = vec4()\n    id = int(flat)\n");
        assert_eq!(
            block.declare_output(None).unwrap(),
            vec!["layout(location=0) out vec4 color;", "flat layout(location=1) out int id;"]
        );
        assert!(matches!(
            block.declare_input("fs_out", None),
            Err(CompileError::MalformedDeclaration(_))
        ));
    }

    #[test]
    fn empty_blocks_declare_nothing() {
        let block = block("class TesOut(ShaderInterface):\n    gl_Position = vec4()\n");
        assert!(block.declare_output(None).unwrap().is_empty());
    }

    #[test]
    fn rejects_uniform_arrays_and_outputs() {
        let block = block("class Globals(UniformBlock):\n    u_time = float()\n");
        assert!(block.declare_input("g", Some(ArrayLength::Unsized)).is_err());
        assert!(block.declare_output(None).is_err());
    }

    #[test]
    fn rejects_non_constructor_members() {
        assert!(matches!(
            resolve("class Bad(UniformBlock):\n    u_time = 1.0\n"),
            Err(CompileError::MalformedDeclaration(_))
        ));
        assert!(matches!(
            resolve("class Bad(ShaderInterface):\n    color = vec4(centroid)\n"),
            Err(CompileError::UnresolvedType(name)) if name == "centroid"
        ));
        assert!(matches!(
            resolve("class Bad(ShaderInterface):\n    color = vec4(1.0)\n"),
            Err(CompileError::MalformedDeclaration(_))
        ));
    }

    #[test]
    fn declares_structs_without_private_members() {
        let def = match resolve(
            "class Light(GlslStruct):\n    position = vec3()\n    _cache = float()\n    material = Material()\n",
        )
        .unwrap()
        {
            Schema::Struct(def) => def,
            other => panic!("expected struct, got {:?}", other),
        };
        assert_eq!(
            def.declare(),
            vec!["struct Light {", "    vec3 position;", "    Material material;", "};"]
        );
        assert_eq!(def.referenced_types().collect::<Vec<_>>(), vec!["Material"]);
    }

    #[test]
    fn builder_matches_parsed_schema() {
        let built = InterfaceBlock::new("Globals", BlockKind::Uniform)
            .member("u_time", TypeMarker::Builtin("float"))
            .member("gl_ignored", TypeMarker::Builtin("float"));
        assert_eq!(built, block("class Globals(UniformBlock):\n    u_time = float()\n"));
    }
}
