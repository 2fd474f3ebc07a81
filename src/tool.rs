//! Tool identities and per-tool capability profiles.
//!
//! All per-tool variation (payload layout rules, shim sets, service
//! defaults) lives in a static profile table selected by [`ToolKind`],
//! so the extractor, normalizer, and orchestrator stay tool-agnostic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::layout::LayoutRule;

/// The closed set of managed tools.
///
/// Stateless runtimes are invoked per command through shims; stateful
/// engines additionally run a long-lived server with a data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Node,
    Deno,
    Java,
    Sqlite,
    Postgres,
    Mysql,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::Node,
        ToolKind::Deno,
        ToolKind::Java,
        ToolKind::Sqlite,
        ToolKind::Postgres,
        ToolKind::Mysql,
    ];

    /// Directory name under `toolchains/` and key in `current.json`.
    pub fn dir_name(self) -> &'static str {
        self.profile().dir_name
    }

    pub fn profile(self) -> &'static ToolProfile {
        profile(self)
    }

    /// True for engines that run a long-lived server process.
    pub fn is_stateful(self) -> bool {
        self.profile().service.is_some()
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().display)
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .iter()
            .copied()
            .find(|t| t.dir_name() == s)
            .ok_or_else(|| format!("unknown tool: {}", s))
    }
}

/// One forwarding command exposed by an active version.
///
/// `target` is relative to the canonical install directory; `args` is a
/// fixed argument prefix inserted before the caller's arguments.
#[derive(Debug, Clone, Copy)]
pub struct ShimDef {
    pub name: &'static str,
    pub target: &'static str,
    pub args: &'static [&'static str],
}

/// Service defaults for stateful engines.
#[derive(Debug, Clone, Copy)]
pub struct ServiceDefaults {
    pub default_port: u16,
    pub default_cluster: &'static str,
    /// Initialize and start a default cluster on first install.
    pub auto_activate: bool,
}

/// Static capabilities of one tool: how its archives are laid out, which
/// commands it shims, and (for engines) how its service is run.
#[derive(Debug)]
pub struct ToolProfile {
    pub kind: ToolKind,
    pub dir_name: &'static str,
    pub display: &'static str,
    pub shims: &'static [ShimDef],
    pub layout_rules: &'static [LayoutRule],
    pub service: Option<ServiceDefaults>,
}

impl ToolProfile {
    /// The command users most associate with the tool (first shim).
    pub fn primary_command(&self) -> &'static str {
        self.shims[0].name
    }

    /// Names of every shim this tool produces.
    pub fn shim_names(&self) -> Vec<String> {
        self.shims.iter().map(|s| s.name.to_string()).collect()
    }
}

const NODE: ToolProfile = ToolProfile {
    kind: ToolKind::Node,
    dir_name: "node",
    display: "Node.js",
    shims: &[
        ShimDef { name: "node", target: "bin/node", args: &[] },
        ShimDef { name: "npm", target: "bin/npm", args: &[] },
        ShimDef { name: "npx", target: "bin/npx", args: &[] },
    ],
    layout_rules: &[
        LayoutRule::DirPrefix { prefix: "node-", nested: &[] },
        LayoutRule::BareTree { markers: &["bin"] },
    ],
    service: None,
};

const DENO: ToolProfile = ToolProfile {
    kind: ToolKind::Deno,
    dir_name: "deno",
    display: "Deno",
    shims: &[ShimDef { name: "deno", target: "deno", args: &[] }],
    layout_rules: &[
        LayoutRule::DirPrefix { prefix: "deno-", nested: &[] },
        // Upstream zips ship the bare binary with no wrapper directory.
        LayoutRule::BareTree { markers: &["deno"] },
    ],
    service: None,
};

const JAVA: ToolProfile = ToolProfile {
    kind: ToolKind::Java,
    dir_name: "java",
    display: "Java",
    shims: &[
        ShimDef { name: "java", target: "bin/java", args: &[] },
        ShimDef { name: "javac", target: "bin/javac", args: &[] },
        ShimDef { name: "jar", target: "bin/jar", args: &[] },
    ],
    layout_rules: &[
        // macOS bundles nest the real tree inside <dist>.jdk/Contents/Home.
        LayoutRule::BundleSuffix { suffix: ".jdk", nested: &["Contents/Home", "Home"] },
        LayoutRule::DirPrefix { prefix: "jdk", nested: &["Contents/Home", "Home"] },
        LayoutRule::DirPrefix { prefix: "zulu", nested: &["Contents/Home", "Home"] },
        LayoutRule::BareTree { markers: &["bin"] },
    ],
    service: None,
};

const SQLITE: ToolProfile = ToolProfile {
    kind: ToolKind::Sqlite,
    dir_name: "sqlite",
    display: "SQLite",
    shims: &[ShimDef { name: "sqlite3", target: "sqlite3", args: &[] }],
    layout_rules: &[
        LayoutRule::DirPrefix { prefix: "sqlite-", nested: &[] },
        LayoutRule::BareTree { markers: &["sqlite3"] },
    ],
    service: None,
};

const POSTGRES: ToolProfile = ToolProfile {
    kind: ToolKind::Postgres,
    dir_name: "postgres",
    display: "PostgreSQL",
    shims: &[
        ShimDef { name: "psql", target: "bin/psql", args: &[] },
        ShimDef { name: "pg_dump", target: "bin/pg_dump", args: &[] },
        ShimDef { name: "pg_restore", target: "bin/pg_restore", args: &[] },
    ],
    layout_rules: &[
        LayoutRule::DirPrefix { prefix: "pgsql", nested: &[] },
        LayoutRule::DirPrefix { prefix: "postgresql-", nested: &[] },
        LayoutRule::BareTree { markers: &["bin"] },
    ],
    service: Some(ServiceDefaults {
        default_port: 5432,
        default_cluster: "main",
        auto_activate: true,
    }),
};

const MYSQL: ToolProfile = ToolProfile {
    kind: ToolKind::Mysql,
    dir_name: "mysql",
    display: "MySQL",
    shims: &[
        ShimDef { name: "mysql", target: "bin/mysql", args: &[] },
        ShimDef { name: "mysqldump", target: "bin/mysqldump", args: &[] },
        ShimDef { name: "mysqladmin", target: "bin/mysqladmin", args: &[] },
    ],
    layout_rules: &[
        LayoutRule::DirPrefix { prefix: "mysql-", nested: &[] },
        LayoutRule::BareTree { markers: &["bin"] },
    ],
    service: Some(ServiceDefaults {
        default_port: 3306,
        default_cluster: "main",
        auto_activate: true,
    }),
};

/// Look up the static profile for a tool.
pub fn profile(kind: ToolKind) -> &'static ToolProfile {
    match kind {
        ToolKind::Node => &NODE,
        ToolKind::Deno => &DENO,
        ToolKind::Java => &JAVA,
        ToolKind::Sqlite => &SQLITE,
        ToolKind::Postgres => &POSTGRES,
        ToolKind::Mysql => &MYSQL,
    }
}
