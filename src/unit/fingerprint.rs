//! Structural fingerprint of a unit's initializer code.
//!
//! Projects the initializer instruction stream onto runs of tokens:
//!
//! - `ldc type <Name>` for type literals, `ldc <kind> <literal>` otherwise
//! - `invoke <kind> <Owner>.<name><descriptor>` for invoked operations
//! - a `label` (jump target) closes the current run
//!
//! Line markers and every other opcode are ignored, so recompiling with
//! shifted line numbers yields the same fingerprint.

use std::path::Path;

use super::{ConstantKind, Instruction, Unit, UnitError, UnitName};

/// Ordered token runs, one per basic block that produced tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint {
    runs: Vec<Vec<String>>,
}

impl Fingerprint {
    /// Fingerprint every initializer of `unit`, in declaration order.
    pub fn of(unit: &Unit) -> Self {
        let mut builder = RunBuilder::default();
        for method in unit.initializers() {
            for instruction in &method.body {
                builder.push(instruction);
            }
            builder.flush();
        }
        builder.finish()
    }

    /// Load unit `name` from the output directory and fingerprint it.
    pub fn load(root: &Path, name: &UnitName) -> Result<Self, UnitError> {
        Unit::load_named(root, name).map(|unit| Self::of(&unit))
    }

    pub fn runs(&self) -> &[Vec<String>] {
        &self.runs
    }

    pub fn token_count(&self) -> usize {
        self.runs.iter().map(Vec::len).sum()
    }

    /// Short blake3 digest for log output. Comparison always uses the runs.
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for run in &self.runs {
            for token in run {
                hasher.update(token.as_bytes());
                hasher.update(&[0]);
            }
            hasher.update(&[1]);
        }
        hex::encode(&hasher.finalize().as_bytes()[..8])
    }
}

#[derive(Default)]
struct RunBuilder {
    runs: Vec<Vec<String>>,
    current: Vec<String>,
}

impl RunBuilder {
    fn push(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::Label(_) => self.flush(),
            other => {
                if let Some(token) = token(other) {
                    self.current.push(token);
                }
            }
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.runs.push(std::mem::take(&mut self.current));
        }
    }

    fn finish(mut self) -> Fingerprint {
        self.flush();
        Fingerprint { runs: self.runs }
    }
}

fn token(instruction: &Instruction) -> Option<String> {
    match instruction {
        Instruction::Ldc {
            kind: ConstantKind::Type,
            value,
        } => Some(format!("ldc type {value}")),
        Instruction::Ldc { kind, value } => Some(format!("ldc {} {value}", kind.label())),
        Instruction::Invoke {
            kind,
            owner,
            name,
            descriptor,
        } => Some(format!("invoke {} {owner}.{name}{descriptor}", kind.label())),
        Instruction::Line(_) | Instruction::Label(_) | Instruction::Other { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::parse::parse;

    fn app(body: &str) -> Unit {
        parse(&format!(
            "unit com.example.App\nmethod <init> ()V\n{body}\nend\nmethod helper ()V\n  ldc str \"ignored\"\nend\n"
        ))
        .unwrap()
    }

    const V1: &str = r#"
  line 10
  ldc str "v1"
  invoke virtual com.example.Router get (Ljava/lang/String;)V
"#;

    #[test]
    fn test_tokens_in_program_order() {
        let fp = Fingerprint::of(&app(V1));
        assert_eq!(
            fp.runs(),
            &[vec![
                "ldc str \"v1\"".to_string(),
                "invoke virtual com.example.Router.get(Ljava/lang/String;)V".to_string(),
            ]]
        );
        assert_eq!(fp.token_count(), 2);
    }

    #[test]
    fn test_line_numbers_do_not_matter() {
        let shifted = V1.replace("line 10", "line 42\n  line 43");
        assert_eq!(Fingerprint::of(&app(V1)), Fingerprint::of(&app(&shifted)));
    }

    #[test]
    fn test_constant_change_is_detected() {
        let v2 = V1.replace("\"v1\"", "\"v2\"");
        let (a, b) = (Fingerprint::of(&app(V1)), Fingerprint::of(&app(&v2)));
        assert_ne!(a, b);
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_labels_split_runs() {
        let body = "  ldc int 1\n  label L0\n  label L1\n  ldc type com.example.Router\n  ifeq L0\n";
        let fp = Fingerprint::of(&app(body));
        assert_eq!(
            fp.runs(),
            &[
                vec!["ldc int 1".to_string()],
                vec!["ldc type com.example.Router".to_string()],
            ]
        );
    }

    #[test]
    fn test_block_boundary_is_structural() {
        let joined = "  ldc int 1\n  ldc int 2\n";
        let split = "  ldc int 1\n  label L0\n  ldc int 2\n";
        assert_ne!(
            Fingerprint::of(&app(joined)),
            Fingerprint::of(&app(split))
        );
    }

    #[test]
    fn test_non_initializer_methods_ignored() {
        let mut unit = app(V1);
        let before = Fingerprint::of(&unit);
        unit.methods.retain(|m| m.is_initializer());
        assert_eq!(Fingerprint::of(&unit), before);
    }

    #[test]
    fn test_each_initializer_is_its_own_run() {
        let unit = parse(
            "unit A\nmethod <init> ()V\n  ldc int 1\nend\nmethod <init> (I)V\n  ldc int 1\nend\n",
        )
        .unwrap();
        assert_eq!(Fingerprint::of(&unit).runs().len(), 2);
    }

    #[test]
    fn test_empty_initializer() {
        let fp = Fingerprint::of(&app("  aload 0\n  return"));
        assert!(fp.runs().is_empty());
        assert_eq!(fp, Fingerprint::default());
        assert_eq!(fp.digest().len(), 16);
    }
}
