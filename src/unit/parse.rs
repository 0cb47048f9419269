//! Compiled unit listing parser.
//!
//! ```text
//! unit com.example.App
//! method <init> ()V
//!   line 12
//!   ldc str "v1"
//!   invoke virtual com.example.Router get (Ljava/lang/String;)V
//!   label L1
//! end
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{INITIALIZER, UnitName};

/// Errors raised while reading or parsing a compiled unit.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("failed to read compiled unit `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("missing `unit` header")]
    MissingHeader,

    #[error("expected unit `{expected}`, found `{found}`")]
    NameMismatch { expected: UnitName, found: UnitName },
}

/// Kind of a loaded constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantKind {
    Str,
    Int,
    Long,
    Float,
    Double,
    /// A type literal; the value is the referenced type's name.
    Type,
}

impl ConstantKind {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "str" => Self::Str,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "type" => Self::Type,
            _ => return None,
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Type => "type",
        }
    }
}

/// Dispatch kind of an invoked operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
    Virtual,
    Static,
    Special,
    Interface,
}

impl InvokeKind {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "virtual" => Self::Virtual,
            "static" => Self::Static,
            "special" => Self::Special,
            "interface" => Self::Interface,
            _ => return None,
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Virtual => "virtual",
            Self::Static => "static",
            Self::Special => "special",
            Self::Interface => "interface",
        }
    }
}

/// One instruction of a method body, in program order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Source line marker. Positional metadata only.
    Line(u32),
    /// Jump target; starts a new basic block.
    Label(String),
    /// Constant load.
    Ldc { kind: ConstantKind, value: String },
    /// Invoked operation.
    Invoke {
        kind: InvokeKind,
        owner: String,
        name: String,
        descriptor: String,
    },
    /// Any other opcode, operands kept verbatim.
    Other { opcode: String, operands: String },
}

/// A method with its instruction stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub descriptor: String,
    pub body: Vec<Instruction>,
}

impl Method {
    pub fn is_initializer(&self) -> bool {
        self.name == INITIALIZER
    }
}

/// A parsed compiled unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub name: UnitName,
    pub methods: Vec<Method>,
}

impl Unit {
    /// Read and parse a unit listing from disk.
    pub fn load(path: &Path) -> Result<Self, UnitError> {
        let source =
            fs::read_to_string(path).map_err(|err| UnitError::Io(path.to_path_buf(), err))?;
        parse(&source)
    }

    /// Load the unit `name` from the output directory `root`, checking that
    /// the listing declares the expected name.
    pub fn load_named(root: &Path, name: &UnitName) -> Result<Self, UnitError> {
        let unit = Self::load(&root.join(name.to_relative_path()))?;
        if &unit.name != name {
            return Err(UnitError::NameMismatch {
                expected: name.clone(),
                found: unit.name,
            });
        }
        Ok(unit)
    }

    /// Initializer methods in declaration order.
    pub fn initializers(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().filter(|m| m.is_initializer())
    }
}

/// Parse a unit listing.
pub fn parse(source: &str) -> Result<Unit, UnitError> {
    let mut name: Option<UnitName> = None;
    let mut methods = Vec::new();
    let mut current: Option<Method> = None;

    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let (opcode, rest) = split_word(text);
        match opcode {
            "unit" => {
                if name.is_some() {
                    return Err(syntax(line, "duplicate `unit` header"));
                }
                if rest.is_empty() || rest.contains(char::is_whitespace) {
                    return Err(syntax(line, "`unit` expects a single name"));
                }
                name = Some(UnitName::new(rest));
            }
            "method" => {
                if name.is_none() {
                    return Err(UnitError::MissingHeader);
                }
                if current.is_some() {
                    return Err(syntax(line, "nested `method` (missing `end`)"));
                }
                let (method_name, descriptor) = split_word(rest);
                if method_name.is_empty() || descriptor.is_empty() {
                    return Err(syntax(line, "`method` expects a name and a descriptor"));
                }
                current = Some(Method {
                    name: method_name.to_string(),
                    descriptor: descriptor.to_string(),
                    body: Vec::new(),
                });
            }
            "end" => match current.take() {
                Some(method) => methods.push(method),
                None => return Err(syntax(line, "`end` outside of a method")),
            },
            _ => {
                let Some(method) = current.as_mut() else {
                    return Err(syntax(line, format!("`{opcode}` outside of a method")));
                };
                method.body.push(parse_instruction(line, opcode, rest)?);
            }
        }
    }

    if current.is_some() {
        return Err(syntax(source.lines().count(), "unterminated method (missing `end`)"));
    }

    let name = name.ok_or(UnitError::MissingHeader)?;
    Ok(Unit { name, methods })
}

fn parse_instruction(line: usize, opcode: &str, rest: &str) -> Result<Instruction, UnitError> {
    match opcode {
        "line" => rest
            .parse()
            .map(Instruction::Line)
            .map_err(|_| syntax(line, format!("invalid line number `{rest}`"))),
        "label" => {
            if rest.is_empty() {
                return Err(syntax(line, "`label` expects an id"));
            }
            Ok(Instruction::Label(rest.to_string()))
        }
        "ldc" => {
            let (kind, value) = split_word(rest);
            let kind = ConstantKind::parse(kind)
                .ok_or_else(|| syntax(line, format!("unknown constant kind `{kind}`")))?;
            if value.is_empty() {
                return Err(syntax(line, "`ldc` expects a value"));
            }
            Ok(Instruction::Ldc {
                kind,
                value: value.to_string(),
            })
        }
        "invoke" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            let [kind, owner, name, descriptor] = parts.as_slice() else {
                return Err(syntax(
                    line,
                    "`invoke` expects <kind> <owner> <name> <descriptor>",
                ));
            };
            let kind = InvokeKind::parse(kind)
                .ok_or_else(|| syntax(line, format!("unknown invoke kind `{kind}`")))?;
            Ok(Instruction::Invoke {
                kind,
                owner: owner.to_string(),
                name: name.to_string(),
                descriptor: descriptor.to_string(),
            })
        }
        _ => Ok(Instruction::Other {
            opcode: opcode.to_string(),
            operands: rest.to_string(),
        }),
    }
}

/// Split off the first whitespace-delimited word; the remainder is trimmed.
fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (text, ""),
    }
}

fn syntax(line: usize, message: impl Into<String>) -> UnitError {
    UnitError::Syntax {
        line,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP: &str = r#"
# generated
unit com.example.App

method <init> ()V
  line 3
  aload 0
  invoke special com.example.Base <init> ()V
  ldc str "hello world"
  label L1
  ldc type com.example.Router
end

method toString ()Ljava/lang/String;
  ldc str "App"
  areturn
end
"#;

    #[test]
    fn test_parse_unit() {
        let unit = parse(APP).unwrap();
        assert_eq!(unit.name.as_str(), "com.example.App");
        assert_eq!(unit.methods.len(), 2);

        let init: Vec<_> = unit.initializers().collect();
        assert_eq!(init.len(), 1);
        assert_eq!(init[0].descriptor, "()V");
        assert_eq!(
            init[0].body,
            vec![
                Instruction::Line(3),
                Instruction::Other {
                    opcode: "aload".into(),
                    operands: "0".into()
                },
                Instruction::Invoke {
                    kind: InvokeKind::Special,
                    owner: "com.example.Base".into(),
                    name: "<init>".into(),
                    descriptor: "()V".into(),
                },
                Instruction::Ldc {
                    kind: ConstantKind::Str,
                    value: "\"hello world\"".into()
                },
                Instruction::Label("L1".into()),
                Instruction::Ldc {
                    kind: ConstantKind::Type,
                    value: "com.example.Router".into()
                },
            ]
        );
    }

    #[test]
    fn test_missing_header() {
        let err = parse("method <init> ()V\nend\n").unwrap_err();
        assert!(matches!(err, UnitError::MissingHeader));

        let err = parse("# nothing here\n").unwrap_err();
        assert!(matches!(err, UnitError::MissingHeader));
    }

    #[test]
    fn test_syntax_errors_carry_line() {
        let err = parse("unit A\nmethod <init> ()V\n  ldc blob 1\nend\n").unwrap_err();
        assert!(matches!(err, UnitError::Syntax { line: 3, .. }));

        let err = parse("unit A\nmethod <init> ()V\n  line x\nend\n").unwrap_err();
        assert!(matches!(err, UnitError::Syntax { line: 3, .. }));

        let err = parse("unit A\n  aload 0\n").unwrap_err();
        assert!(matches!(err, UnitError::Syntax { line: 2, .. }));

        let err = parse("unit A\nmethod <init> ()V\n  invoke virtual A\nend\n").unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_unterminated_and_nested_methods() {
        let err = parse("unit A\nmethod <init> ()V\n  aload 0\n").unwrap_err();
        assert!(err.to_string().contains("missing `end`"));

        let err = parse("unit A\nmethod a ()V\nmethod b ()V\nend\n").unwrap_err();
        assert!(matches!(err, UnitError::Syntax { line: 3, .. }));
    }

    #[test]
    fn test_load_named_checks_header() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("com").join("example");
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("App.unit"), "unit com.example.Other\n").unwrap();

        let err = Unit::load_named(dir.path(), &UnitName::new("com.example.App")).unwrap_err();
        assert!(matches!(err, UnitError::NameMismatch { .. }));

        let err = Unit::load_named(dir.path(), &UnitName::new("com.example.Missing")).unwrap_err();
        assert!(matches!(err, UnitError::Io(..)));
    }
}
