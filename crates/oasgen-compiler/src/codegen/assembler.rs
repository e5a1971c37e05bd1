//! Structural model of a generated class file.
//!
//! Every artifact is built as an [`AssemblyUnit`] through [`CodeAssembler`]
//! and rendered in one place, so identical build sequences always produce
//! identical text. Members are rendered in insertion order.
//!
//! Properties and methods live between marker comments:
//!
//! ```text
//! class Post extends BaseModel
//! {
//!     // >>>props>>>
//!     protected $table = 'post';
//!     // <<<props<<<
//!
//!     // >>>methods>>>
//!
//!     public function user()
//!     {
//!         return $this->belongsTo(User::class);
//!     }
//!     // <<<methods<<<
//! }
//! ```
//!
//! Merge mode parses an existing file back into a unit, keeps everything
//! outside the marked regions and swaps in freshly built members.

use std::path::Path;

use crate::diagnostic::GenError;

pub const PROPS_START: &str = "// >>>props>>>";
pub const PROPS_END: &str = "// <<<props<<<";
pub const METHODS_START: &str = "// >>>methods>>>";
pub const METHODS_END: &str = "// <<<methods<<<";

/// File tag opening every generated file.
pub const FILE_TAG: &str = "<?php";

const INDENT: &str = "    ";
const BODY_INDENT: &str = "        ";

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

/// A file-level import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseDecl {
    pub path: String,
    pub alias: Option<String>,
}

impl UseDecl {
    fn render(&self) -> String {
        match &self.alias {
            Some(alias) => format!("use {} as {};", self.path, alias),
            None => format!("use {};", self.path),
        }
    }

    fn parse(line: &str) -> Option<Self> {
        let inner = line.trim().strip_prefix("use ")?.strip_suffix(';')?.trim();
        let (path, alias) = match inner.split_once(" as ") {
            Some((path, alias)) => (path.trim(), Some(alias.trim().to_string())),
            None => (inner, None),
        };
        Some(Self {
            path: path.to_string(),
            alias,
        })
    }
}

/// Class name and ancestry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: String,
    pub parent: Option<String>,
    /// Never emitted by the generators; read back from an existing artifact
    /// so interfaces added by hand survive a merge.
    pub interfaces: Vec<String>,
}

impl ClassDecl {
    fn render(&self) -> String {
        let mut line = format!("class {}", self.name);
        if let Some(parent) = &self.parent {
            line.push_str(&format!(" extends {}", parent));
        }
        if !self.interfaces.is_empty() {
            line.push_str(&format!(" implements {}", self.interfaces.join(", ")));
        }
        line
    }

    fn parse(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix("class ")?;
        let rest = rest.trim_end_matches('{').trim();

        let (head, interfaces) = match rest.split_once(" implements ") {
            Some((head, list)) => (
                head,
                list.split(',')
                    .map(|i| i.trim().to_string())
                    .filter(|i| !i.is_empty())
                    .collect(),
            ),
            None => (rest, Vec::new()),
        };
        let (name, parent) = match head.split_once(" extends ") {
            Some((name, parent)) => (name.trim(), Some(parent.trim().to_string())),
            None => (head.trim(), None),
        };

        Some(Self {
            name: name.to_string(),
            parent,
            interfaces,
        })
    }
}

/// A property declaration. `default` is rendered verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDecl {
    pub visibility: Visibility,
    pub is_static: bool,
    pub ty: Option<String>,
    pub name: String,
    pub default: Option<String>,
}

impl PropertyDecl {
    pub fn new(visibility: Visibility, name: impl Into<String>) -> Self {
        Self {
            visibility,
            is_static: false,
            ty: None,
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    pub fn with_type(mut self, ty: impl Into<String>) -> Self {
        self.ty = Some(ty.into());
        self
    }

    fn render(&self) -> String {
        let mut line = format!("{}{}", INDENT, self.visibility.as_str());
        if self.is_static {
            line.push_str(" static");
        }
        if let Some(ty) = &self.ty {
            line.push(' ');
            line.push_str(ty);
        }
        line.push_str(&format!(" ${}", self.name));
        if let Some(default) = &self.default {
            line.push_str(&format!(" = {}", default));
        }
        line.push(';');
        line
    }

    fn parse(line: &str) -> Option<Self> {
        let inner = line.trim().strip_suffix(';')?;
        let (head, default) = match inner.split_once(" = ") {
            Some((head, default)) => (head, Some(default.trim().to_string())),
            None => (inner, None),
        };

        let mut tokens = head.split_whitespace().peekable();
        let visibility = Visibility::parse(tokens.next()?)?;
        let is_static = tokens.next_if_eq(&"static").is_some();
        let ty = match tokens.peek() {
            Some(token) if !token.starts_with('$') => tokens.next().map(str::to_string),
            _ => None,
        };
        let name = tokens.next()?.strip_prefix('$')?.to_string();
        if tokens.next().is_some() {
            return None;
        }

        Some(Self {
            visibility,
            is_static,
            ty,
            name,
            default,
        })
    }
}

/// A method declaration; body lines are relative to the method body indent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub visibility: Visibility,
    pub is_static: bool,
    pub name: String,
    pub params: Vec<String>,
    pub return_type: Option<String>,
    pub body: Vec<String>,
}

impl MethodDecl {
    pub fn new(visibility: Visibility, name: impl Into<String>) -> Self {
        Self {
            visibility,
            is_static: false,
            name: name.into(),
            params: Vec::new(),
            return_type: None,
            body: Vec::new(),
        }
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_return_type(mut self, ty: impl Into<String>) -> Self {
        self.return_type = Some(ty.into());
        self
    }

    fn signature(&self) -> String {
        let mut line = format!("{}{}", INDENT, self.visibility.as_str());
        if self.is_static {
            line.push_str(" static");
        }
        line.push_str(&format!(" function {}({})", self.name, self.params.join(", ")));
        if let Some(ty) = &self.return_type {
            line.push_str(&format!(": {}", ty));
        }
        line
    }

    fn render_into(&self, out: &mut Vec<String>) {
        out.push(self.signature());
        out.push(format!("{}{{", INDENT));
        for line in &self.body {
            if line.is_empty() {
                out.push(String::new());
            } else {
                out.push(format!("{}{}", BODY_INDENT, line));
            }
        }
        out.push(format!("{}}}", INDENT));
    }

    fn parse_signature(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        let (modifiers, rest) = trimmed.split_once("function ")?;

        let mut tokens = modifiers.split_whitespace();
        let visibility = tokens.next().and_then(Visibility::parse).unwrap_or(Visibility::Public);
        let is_static = tokens.any(|t| t == "static");

        let (name, rest) = rest.split_once('(')?;
        let close = rest.rfind(')')?;
        let params = rest[..close]
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let return_type = rest[close + 1..]
            .trim()
            .strip_prefix(':')
            .map(|ty| ty.trim().to_string())
            .filter(|ty| !ty.is_empty());

        Some(Self {
            visibility,
            is_static,
            name: name.trim().to_string(),
            params,
            return_type,
            body: Vec::new(),
        })
    }
}

/// Hand-written regions outside the generated markers, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreservedRegions {
    /// Between the imports and the class line.
    pub before_class: Vec<String>,
    /// Inside the class, before the properties marker.
    pub class_head: Vec<String>,
    /// Between the properties and methods regions.
    pub between: Vec<String>,
    /// Inside the class, after the methods marker.
    pub after_methods: Vec<String>,
    /// After the closing brace of the class.
    pub after_class: Vec<String>,
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyUnit {
    pub tag: String,
    pub namespace: Option<String>,
    pub uses: Vec<UseDecl>,
    pub class: Option<ClassDecl>,
    /// Traits used by the class.
    pub traits: Vec<String>,
    pub properties: Vec<PropertyDecl>,
    pub methods: Vec<MethodDecl>,
    /// Top-level lines of a file without a class.
    pub body: Vec<String>,
    pub preserved: PreservedRegions,
}

impl Default for AssemblyUnit {
    fn default() -> Self {
        Self {
            tag: FILE_TAG.to_string(),
            namespace: None,
            uses: Vec::new(),
            class: None,
            traits: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            body: Vec::new(),
            preserved: PreservedRegions::default(),
        }
    }
}

impl AssemblyUnit {
    /// Renders the unit to source text.
    pub fn render(&self) -> String {
        let mut out = vec![self.tag.clone(), String::new()];

        if let Some(namespace) = &self.namespace {
            out.push(format!("namespace {};", namespace));
            out.push(String::new());
        }

        if !self.uses.is_empty() {
            out.extend(self.uses.iter().map(UseDecl::render));
            out.push(String::new());
        }

        push_region(&mut out, &self.preserved.before_class);

        match &self.class {
            None => out.extend(self.body.iter().cloned()),
            Some(class) => {
                out.push(class.render());
                out.push("{".to_string());

                if !self.traits.is_empty() {
                    out.extend(self.traits.iter().map(|t| format!("{}use {};", INDENT, t)));
                    out.push(String::new());
                }
                push_region(&mut out, &self.preserved.class_head);

                out.push(format!("{}{}", INDENT, PROPS_START));
                out.extend(self.properties.iter().map(PropertyDecl::render));
                out.push(format!("{}{}", INDENT, PROPS_END));
                out.push(String::new());

                push_region(&mut out, &self.preserved.between);

                out.push(format!("{}{}", INDENT, METHODS_START));
                for method in &self.methods {
                    out.push(String::new());
                    method.render_into(&mut out);
                }
                out.push(format!("{}{}", INDENT, METHODS_END));
                if !self.preserved.after_methods.is_empty() {
                    out.push(String::new());
                    out.extend(self.preserved.after_methods.iter().cloned());
                }
                out.push("}".to_string());

                if !self.preserved.after_class.is_empty() {
                    out.push(String::new());
                    out.extend(self.preserved.after_class.iter().cloned());
                }
            }
        }

        let text = out.join("\n");
        format!("{}\n", text.trim_end())
    }

    /// Parses previously generated text back into a unit.
    ///
    /// Fails with [`GenError::ArtifactMarkerMissing`] when a region marker is
    /// absent or out of order. Lines inside the generated regions that do not
    /// parse as members are dropped.
    pub fn parse(text: &str, path: &Path) -> Result<Self, GenError> {
        let lines: Vec<&str> = text.lines().collect();

        let mut cursor = 0;
        let mut positions = [0usize; 4];
        for (slot, marker) in [PROPS_START, PROPS_END, METHODS_START, METHODS_END].iter().enumerate() {
            let found = lines[cursor..]
                .iter()
                .position(|l| l.trim() == *marker)
                .map(|offset| cursor + offset)
                .ok_or_else(|| GenError::ArtifactMarkerMissing {
                    path: path.to_path_buf(),
                    marker: marker.to_string(),
                })?;
            positions[slot] = found;
            cursor = found + 1;
        }
        let [props_start, props_end, methods_start, methods_end] = positions;

        let mut unit = AssemblyUnit::default();
        parse_head(&lines[..props_start], &mut unit);

        unit.properties = lines[props_start + 1..props_end]
            .iter()
            .filter_map(|l| PropertyDecl::parse(l))
            .collect();
        unit.preserved.between = trim_blank(&lines[props_end + 1..methods_start]);
        unit.methods = parse_methods(&lines[methods_start + 1..methods_end]);

        let tail = &lines[methods_end + 1..];
        match tail.iter().rposition(|l| l.trim() == "}") {
            Some(close) => {
                unit.preserved.after_methods = trim_blank(&tail[..close]);
                unit.preserved.after_class = trim_blank(&tail[close + 1..]);
            }
            None => unit.preserved.after_methods = trim_blank(tail),
        }

        Ok(unit)
    }

    /// Combines a previously generated unit with a freshly built one.
    ///
    /// Everything outside the marked regions comes from `existing`; imports
    /// and traits are the union of both; properties and methods come from
    /// `fresh`.
    pub fn merge(existing: AssemblyUnit, fresh: AssemblyUnit) -> AssemblyUnit {
        let mut uses = existing.uses;
        for decl in fresh.uses {
            if !uses.iter().any(|u| u.path == decl.path) {
                uses.push(decl);
            }
        }

        let mut traits = existing.traits;
        for name in fresh.traits {
            if !traits.contains(&name) {
                traits.push(name);
            }
        }

        AssemblyUnit {
            tag: existing.tag,
            namespace: existing.namespace.or(fresh.namespace),
            uses,
            class: existing.class.or(fresh.class),
            traits,
            properties: fresh.properties,
            methods: fresh.methods,
            body: fresh.body,
            preserved: existing.preserved,
        }
    }
}

/// Merges `fresh` into the text of an existing artifact.
///
/// Files without a class are generated whole and simply replaced.
pub fn splice(existing: &str, path: &Path, fresh: AssemblyUnit) -> Result<String, GenError> {
    if fresh.class.is_none() {
        return Ok(fresh.render());
    }
    let parsed = AssemblyUnit::parse(existing, path)?;
    Ok(AssemblyUnit::merge(parsed, fresh).render())
}

/// Builds an [`AssemblyUnit`] through ordered appends.
#[derive(Debug, Default)]
pub struct CodeAssembler {
    unit: AssemblyUnit,
    open_method: Option<MethodDecl>,
}

impl CodeAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.unit.namespace = Some(namespace.into());
        self
    }

    /// Adds an import; duplicates are ignored.
    pub fn use_decl(&mut self, path: impl Into<String>) -> &mut Self {
        let path = path.into();
        if !self.unit.uses.iter().any(|u| u.path == path) {
            self.unit.uses.push(UseDecl { path, alias: None });
        }
        self
    }

    pub fn start_class(&mut self, name: impl Into<String>, parent: Option<&str>) -> &mut Self {
        self.unit.class = Some(ClassDecl {
            name: name.into(),
            parent: parent.map(str::to_string),
            interfaces: Vec::new(),
        });
        self
    }

    pub fn use_trait(&mut self, name: impl Into<String>) -> &mut Self {
        self.unit.traits.push(name.into());
        self
    }

    pub fn property(&mut self, property: PropertyDecl) -> &mut Self {
        self.unit.properties.push(property);
        self
    }

    /// Opens a method; body lines go to it until [`end_method`](Self::end_method).
    pub fn start_method(&mut self, method: MethodDecl) -> &mut Self {
        self.end_method();
        self.open_method = Some(method);
        self
    }

    pub fn body_line(&mut self, line: impl Into<String>) -> &mut Self {
        if let Some(method) = self.open_method.as_mut() {
            method.body.push(line.into());
        }
        self
    }

    pub fn end_method(&mut self) -> &mut Self {
        if let Some(method) = self.open_method.take() {
            self.unit.methods.push(method);
        }
        self
    }

    /// Appends a top-level line to a file without a class.
    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.unit.body.push(line.into());
        self
    }

    /// Closes any open method and returns the unit.
    pub fn finish(&mut self) -> AssemblyUnit {
        self.end_method();
        std::mem::take(&mut self.unit)
    }
}

/// Quotes a string literal.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn push_region(out: &mut Vec<String>, region: &[String]) {
    if !region.is_empty() {
        out.extend(region.iter().cloned());
        out.push(String::new());
    }
}

fn trim_blank(lines: &[&str]) -> Vec<String> {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].iter().map(|l| l.to_string()).collect(),
        _ => Vec::new(),
    }
}

fn parse_head(lines: &[&str], unit: &mut AssemblyUnit) {
    let mut before_class = Vec::new();
    let mut class_head = Vec::new();
    let mut in_class = false;
    let mut tag_seen = false;

    for line in lines {
        let trimmed = line.trim();

        if in_class {
            if trimmed == "{" && unit.traits.is_empty() && class_head.is_empty() {
                continue;
            }
            match UseDecl::parse(trimmed) {
                Some(decl) => unit.traits.push(decl.path),
                None => class_head.push(line.to_string()),
            }
            continue;
        }

        if !tag_seen && trimmed.starts_with("<?") {
            unit.tag = trimmed.to_string();
            tag_seen = true;
        } else if let Some(namespace) = trimmed.strip_prefix("namespace ").and_then(|n| n.strip_suffix(';')) {
            unit.namespace = Some(namespace.trim().to_string());
        } else if let Some(decl) = UseDecl::parse(trimmed) {
            unit.uses.push(decl);
        } else if let Some(class) = ClassDecl::parse(trimmed) {
            unit.class = Some(class);
            in_class = true;
        } else {
            before_class.push(*line);
        }
    }

    unit.preserved.before_class = trim_blank(&before_class);
    let class_head: Vec<&str> = class_head.iter().map(String::as_str).collect();
    unit.preserved.class_head = trim_blank(&class_head);
}

fn parse_methods(lines: &[&str]) -> Vec<MethodDecl> {
    let closing = format!("{}}}", INDENT);
    let mut methods = Vec::new();
    let mut iter = lines.iter();

    while let Some(line) = iter.next() {
        let Some(mut method) = MethodDecl::parse_signature(line) else {
            continue;
        };

        for body_line in iter.by_ref() {
            if body_line.trim_end() == closing {
                break;
            }
            if body_line.trim() == "{" && method.body.is_empty() {
                continue;
            }
            let stripped = body_line
                .strip_prefix(BODY_INDENT)
                .unwrap_or_else(|| body_line.trim_start());
            method.body.push(stripped.trim_end().to_string());
        }

        methods.push(method);
    }

    methods
}
