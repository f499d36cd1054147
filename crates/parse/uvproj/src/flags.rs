//! Compiler flag fragments (`VariousControls`) and their composition.
//!
//! Each node of the hierarchy may declare four categories of flags. The
//! effective flags of a file are derived from its target, group and own
//! fragment:
//!
//! ```text
//! OPTIONS      = INCLUDE_PATH + MISC + DEFINE
//! INCLUDE_PATH = File.include + Group.include + Target.include
//! MISC         = Target.misc + Group.misc + File.misc
//! DEFINE       = Target.undefine + Target.define
//!              + Group.undefine + Group.define
//!              + File.undefine + File.define
//! ```
//!
//! Entries are never deduplicated: a later `-D` on the command line
//! overrides an earlier one.

use std::str::FromStr;

use crate::project::TreeNode;
use crate::to_posix_path;

/// Which compiler section of the project schema holds the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// 8051 toolchain (`C51/VariousControls`).
    C51,
    /// ARM toolchains (`Cads/VariousControls`).
    Arm,
}

impl Dialect {
    /// Element name of the compiler section.
    #[must_use]
    pub fn section(self) -> &'static str {
        match self {
            Self::C51 => "C51",
            Self::Arm => "Cads",
        }
    }
}

/// How escaped quotes inside define values are recovered.
///
/// µVision stores `-DNAME="value"` as `NAME=\"value\"`. Older projects have
/// been seen with a doubled backslash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefineUnescape {
    /// `\"` becomes `"`.
    #[default]
    BackslashQuote,
    /// `\\"` becomes `"`.
    DoubleBackslashQuote,
    /// Defines are emitted as stored.
    Verbatim,
}

impl DefineUnescape {
    /// Applies the transform to one define.
    #[must_use]
    pub fn apply(self, define: &str) -> String {
        match self {
            Self::BackslashQuote => define.replace("\\\"", "\""),
            Self::DoubleBackslashQuote => define.replace("\\\\\"", "\""),
            Self::Verbatim => define.to_owned(),
        }
    }
}

impl FromStr for DefineUnescape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backslash-quote" => Ok(Self::BackslashQuote),
            "double-backslash-quote" => Ok(Self::DoubleBackslashQuote),
            "verbatim" => Ok(Self::Verbatim),
            other => Err(format!(
                "unknown define-unescape mode '{other}' \
                 (expected backslash-quote, double-backslash-quote or verbatim)"
            )),
        }
    }
}

/// Options controlling [`EffectiveFlags::render`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Quote recovery applied to every define.
    pub define_unescape: DefineUnescape,
}

// ---- FlagSet ----------------------------------------------------------------

/// The flag fragment declared on a single node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    /// `IncludePath`, split on `;`.
    pub include_paths: Vec<String>,
    /// `Define`, split on `,`.
    pub defines: Vec<String>,
    /// `Undefine`, split on `,`.
    pub undefines: Vec<String>,
    /// `MiscControls`, split on whitespace.
    pub misc: Vec<String>,
}

impl FlagSet {
    /// Extracts the fragment declared on `node`.
    ///
    /// Returns `None` when the node is excluded from the build. A missing
    /// field yields an empty category, not an absent fragment.
    ///
    /// Delimiters inside quoted values (`FOO="(1, 2)"`) are not protected.
    pub fn resolve<N: TreeNode>(node: &N, dialect: Dialect) -> Option<Self> {
        if node.inclusion().is_excluded() {
            return None;
        }

        let field = |name: &str| {
            let path = format!("{}/VariousControls/{name}", dialect.section());
            node.property(&path).unwrap_or_default().to_owned()
        };

        Some(Self {
            include_paths: split_and_trim(&field("IncludePath"), ';'),
            defines: split_and_trim(&field("Define"), ','),
            undefines: split_and_trim(&field("Undefine"), ','),
            misc: field("MiscControls")
                .split_whitespace()
                .map(str::to_owned)
                .collect(),
        })
    }

    /// Returns `true` if every category is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include_paths.is_empty()
            && self.defines.is_empty()
            && self.undefines.is_empty()
            && self.misc.is_empty()
    }

    /// Merges a parent fragment with a child fragment.
    #[must_use]
    pub fn merge(parent: &FlagSet, child: &FlagSet) -> EffectiveFlags {
        EffectiveFlags::from(parent).merge(child)
    }

    /// Renders this fragment on its own.
    #[must_use]
    pub fn render(&self, options: &RenderOptions) -> Vec<String> {
        EffectiveFlags::from(self).render(options)
    }
}

/// Splits on `delimiter`, trimming tokens and dropping empty ones.
fn split_and_trim(text: &str, delimiter: char) -> Vec<String> {
    text.split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

// ---- EffectiveFlags ---------------------------------------------------------

/// A `-U` or `-D` operation, kept in command-line order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Macro {
    /// `-U<name>`.
    Undefine(String),
    /// `-D<name[=value]>`.
    Define(String),
}

impl Macro {
    /// The stored name or `name=value` text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Undefine(s) | Self::Define(s) => s,
        }
    }
}

/// Flags accumulated along a target → group → file chain.
///
/// Undefines and defines share one ordered sequence so that a child's
/// `-U` can cancel a parent's `-D` and vice versa.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveFlags {
    /// Child paths first.
    pub include_paths: Vec<String>,
    /// Parent operations first.
    pub macros: Vec<Macro>,
    /// Parent tokens first.
    pub misc: Vec<String>,
}

impl From<&FlagSet> for EffectiveFlags {
    fn from(set: &FlagSet) -> Self {
        Self::default().merge(set)
    }
}

impl EffectiveFlags {
    /// Appends one more level of the hierarchy.
    #[must_use]
    pub fn merge(&self, child: &FlagSet) -> Self {
        let include_paths = child
            .include_paths
            .iter()
            .chain(&self.include_paths)
            .cloned()
            .collect();

        let macros = self
            .macros
            .iter()
            .cloned()
            .chain(child.undefines.iter().cloned().map(Macro::Undefine))
            .chain(child.defines.iter().cloned().map(Macro::Define))
            .collect();

        let misc = self.misc.iter().chain(&child.misc).cloned().collect();

        Self {
            include_paths,
            macros,
            misc,
        }
    }

    /// Renders the flags as compiler arguments: include paths, then misc
    /// tokens, then macro operations.
    #[must_use]
    pub fn render(&self, options: &RenderOptions) -> Vec<String> {
        let includes = self
            .include_paths
            .iter()
            .map(|p| format!("-I{}", to_posix_path(p)));
        let misc = self.misc.iter().cloned();
        let macros = self.macros.iter().map(|m| match m {
            Macro::Undefine(name) => format!("-U{name}"),
            Macro::Define(def) => format!("-D{}", options.define_unescape.apply(def)),
        });
        includes.chain(misc).chain(macros).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Project;

    fn set(include: &[&str], defines: &[&str], undefines: &[&str], misc: &[&str]) -> FlagSet {
        let own = |v: &[&str]| v.iter().map(|s| (*s).to_owned()).collect();
        FlagSet {
            include_paths: own(include),
            defines: own(defines),
            undefines: own(undefines),
            misc: own(misc),
        }
    }

    /// Inverse of `render` for tokens without escaped quotes.
    fn reparse(tokens: &[String]) -> FlagSet {
        let mut out = FlagSet::default();
        for t in tokens {
            if let Some(p) = t.strip_prefix("-I") {
                out.include_paths.push(p.to_owned());
            } else if let Some(u) = t.strip_prefix("-U") {
                out.undefines.push(u.to_owned());
            } else if let Some(d) = t.strip_prefix("-D") {
                out.defines.push(d.to_owned());
            } else {
                out.misc.push(t.clone());
            }
        }
        out
    }

    #[test]
    fn merge_three_levels_preserves_order_and_duplicates() {
        let t = set(&["t"], &["TD", "DUP"], &["TU"], &["-mt"]);
        let g = set(&["g"], &["GD"], &["GU"], &["-mg"]);
        let f = set(&["f"], &["DUP"], &["FU"], &["-mf"]);

        let merged = FlagSet::merge(&t, &g).merge(&f);

        assert_eq!(merged.include_paths, ["f", "g", "t"]);
        assert_eq!(merged.misc, ["-mt", "-mg", "-mf"]);
        let texts: Vec<_> = merged.macros.iter().map(Macro::text).collect();
        assert_eq!(texts, ["TU", "TD", "DUP", "GU", "GD", "FU", "DUP"]);
        assert!(matches!(merged.macros[0], Macro::Undefine(_)));
        assert!(matches!(merged.macros[1], Macro::Define(_)));
    }

    #[test]
    fn render_order_is_fixed() {
        let t = set(&["inc"], &["A=1"], &["B"], &["--c99"]);
        let args = t.render(&RenderOptions::default());
        assert_eq!(args, ["-Iinc", "--c99", "-UB", "-DA=1"]);
    }

    #[test]
    fn render_converts_include_separators() {
        let t = set(&[".\\inc\\sub"], &[], &[], &[]);
        assert_eq!(t.render(&RenderOptions::default()), ["-I./inc/sub"]);
    }

    #[test]
    fn render_reparse_round_trip() {
        let original = set(&["a", "b/c"], &["X", "Y=2"], &["Z"], &["-O2", "-g"]);
        let tokens = original.render(&RenderOptions::default());
        assert_eq!(reparse(&tokens), original);
    }

    #[test]
    fn define_unescape_modes() {
        let t = set(&[], &[r#"CFG=\"cfg.h\""#], &[], &[]);
        let render = |mode| {
            t.render(&RenderOptions {
                define_unescape: mode,
            })
        };
        assert_eq!(render(DefineUnescape::BackslashQuote), [r#"-DCFG="cfg.h""#]);
        assert_eq!(render(DefineUnescape::Verbatim), [r#"-DCFG=\"cfg.h\""#]);

        let doubled = set(&[], &[r#"CFG=\\"cfg.h\\""#], &[], &[]);
        let args = doubled.render(&RenderOptions {
            define_unescape: DefineUnescape::DoubleBackslashQuote,
        });
        assert_eq!(args, [r#"-DCFG="cfg.h""#]);
    }

    #[test]
    fn define_unescape_from_str() {
        assert_eq!("verbatim".parse::<DefineUnescape>(), Ok(DefineUnescape::Verbatim));
        assert!("other".parse::<DefineUnescape>().is_err());
    }

    #[test]
    fn split_trims_and_drops_empty() {
        assert_eq!(split_and_trim(" a ; ;b;", ';'), ["a", "b"]);
        assert!(split_and_trim("", ',').is_empty());
    }

    const PROJECT: &str = r#"<Project><Targets><Target>
      <TargetName>T</TargetName>
      <TargetOption><TargetArmAds><Cads><VariousControls>
        <MiscControls>  --c99   -g </MiscControls>
        <Define>FOO, BAR=1 ,</Define>
        <Undefine></Undefine>
        <IncludePath>inc1;inc2</IncludePath>
      </VariousControls></Cads></TargetArmAds></TargetOption>
      <Groups>
        <Group><GroupName>G</GroupName>
          <GroupOption><GroupArmAds><Cads><VariousControls>
            <Define>GRP</Define>
          </VariousControls></Cads></GroupArmAds></GroupOption>
          <Files>
            <File><FilePath>a.c</FilePath>
              <FileOption><CommonProperty><IncludeInBuild>0</IncludeInBuild></CommonProperty></FileOption>
            </File>
          </Files>
        </Group>
      </Groups>
    </Target></Targets></Project>"#;

    #[test]
    fn resolve_reads_dialect_section() {
        let p = Project::parse(PROJECT, "p.uvprojx").unwrap();
        let t = p.target("T").unwrap();

        let flags = FlagSet::resolve(t, Dialect::Arm).unwrap();
        assert_eq!(flags.include_paths, ["inc1", "inc2"]);
        assert_eq!(flags.defines, ["FOO", "BAR=1"]);
        assert!(flags.undefines.is_empty());
        assert_eq!(flags.misc, ["--c99", "-g"]);

        // The group's define must not leak into the target's fragment.
        let c51 = FlagSet::resolve(t, Dialect::C51).unwrap();
        assert!(c51.is_empty());
    }

    #[test]
    fn resolve_excluded_node_is_absent() {
        let p = Project::parse(PROJECT, "p.uvprojx").unwrap();
        let group = p.target("T").unwrap().groups()[0];
        assert_eq!(FlagSet::resolve(&group, Dialect::Arm).unwrap().defines, ["GRP"]);
        let file = group.files()[0];
        assert!(FlagSet::resolve(&file, Dialect::Arm).is_none());
    }
}
