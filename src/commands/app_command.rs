use crate::app_state::Section;
use crate::model::BackupType;
use crate::scheduler::model::{parse_time_of_day, Frequency};
use chrono::NaiveTime;
use std::path::PathBuf;
use std::str::FromStr;

/// 命令行里输入的命令
///
/// 解析失败不报错，而是返回带用法说明的 `Unknown`，由界面直接显示。
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Open(Section),
    Refresh,

    UsersSearch(String),
    UserNew(Vec<(String, String)>),
    UserEdit {
        sin: String,
        fields: Vec<(String, String)>,
    },
    UserDelete {
        sin: String,
    },
    UserPhoto {
        sin: String,
        path: PathBuf,
    },
    UsersImport {
        path: PathBuf,
    },

    LeaveFilter(Vec<(String, String)>),
    LeaveFilterClear,
    LeaveEdit {
        id: String,
        fields: Vec<(String, String)>,
    },
    LeaveSet {
        id: String,
        stage: String,
        status: String,
    },
    LeaveDelete {
        id: String,
    },
    LeavePage(usize),

    LogsUpload {
        path: PathBuf,
    },
    LogsClear,

    DeletedSearch(String),
    DeletedRestore {
        sin: String,
    },
    DeletedPurge {
        sin: String,
    },

    BackupCreate {
        backup_type: BackupType,
        description: String,
    },
    BackupRestore {
        id: String,
    },
    BackupDelete {
        id: String,
    },
    BackupDownload {
        id: String,
    },
    BackupScheduleShow,
    BackupScheduleOn {
        frequency: Frequency,
        time: NaiveTime,
    },
    BackupScheduleOff,

    ConfigSet(Vec<(String, String)>),
    ConfigSave,
    ConfigReset,
    SemesterSet(Vec<(String, String)>),
    SemesterSave,
    SemesterReset,
    HolidaysUpload {
        path: PathBuf,
    },
    HolidayEdit {
        id: String,
        fields: Vec<(String, String)>,
    },
    HolidaysSave,
    HolidaysReset,
    HolidayDelete {
        id: String,
    },
    HolidaysClear,

    ProfilePhoto {
        path: PathBuf,
    },
    Logout,
    Help,
    Quit,
    Unknown(String),
}

pub const HELP_TEXT: &str = "可用命令: open <section> | refresh | users search <q> | user new k=v.. | user edit <sin> k=v.. | user delete <sin> | user photo <sin> <path> | users import <csv> | leave filter k=v.. | leave filter clear | leave edit <id> k=v.. | leave set <id> <stage> <status> | leave delete <id> | leave page <n> | logs upload <csv> | logs clear | deleted search <q> | deleted restore <sin> | deleted purge <sin> | backup create [full|incremental] [desc] | backup restore|delete|download <id> | backup schedule [on <daily|weekly|monthly> <HH:MM> | off] | config set k=v.. | config save | config reset | semester set k=v.. | semester save | semester reset | holidays upload <csv> | holidays edit <id> k=v.. | holidays save | holidays reset | holidays delete <id> | holidays clear | profile photo <path> | logout | quit";

/// Tab 补全用的一级命令
pub const TOP_LEVEL: [&str; 16] = [
    "open", "refresh", "users", "user", "leave", "logs", "deleted", "backup", "config",
    "semester", "holidays", "profile", "logout", "help", "quit", "exit",
];

/// 各一级命令的子命令
pub fn subcommands(top: &str) -> &'static [&'static str] {
    match top {
        "open" => &[
            "overview", "users", "leave", "logs", "deleted", "backups", "config", "profile",
        ],
        "users" => &["search", "import"],
        "user" => &["new", "edit", "delete", "photo"],
        "leave" => &["filter", "edit", "set", "delete", "page"],
        "logs" => &["upload", "clear"],
        "deleted" => &["search", "restore", "purge"],
        "backup" => &["create", "restore", "delete", "download", "schedule"],
        "config" | "semester" => &["set", "save", "reset"],
        "holidays" => &["upload", "edit", "save", "reset", "delete", "clear"],
        "profile" => &["photo"],
        _ => &[],
    }
}

impl FromStr for AppCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_args(s);
        if parts.is_empty() {
            return Ok(AppCommand::Unknown("".to_string()));
        }
        let arg = |i: usize| parts.get(i).map(String::as_str);
        let rest = |i: usize| parts.get(i..).map(|p| p.join(" ")).unwrap_or_default();
        let usage = |u: &str| Ok(AppCommand::Unknown(format!("用法: {}", u)));

        match parts[0].as_str() {
            "open" | "goto" => match arg(1).map(str::parse::<Section>) {
                Some(Ok(section)) => Ok(AppCommand::Open(section)),
                Some(Err(e)) => Ok(AppCommand::Unknown(e)),
                None => usage("open <overview|users|leave|logs|deleted|backups|config|profile>"),
            },
            "refresh" | "r" => Ok(AppCommand::Refresh),
            "users" => match arg(1) {
                Some("search") => Ok(AppCommand::UsersSearch(rest(2))),
                Some("import") => match arg(2) {
                    Some(p) => Ok(AppCommand::UsersImport { path: p.into() }),
                    None => usage("users import <csv>"),
                },
                _ => usage("users search <q> | users import <csv>"),
            },
            "user" => match arg(1) {
                Some("new") => match parse_pairs(&parts[2..]) {
                    Ok(fields) if !fields.is_empty() => Ok(AppCommand::UserNew(fields)),
                    Ok(_) => usage("user new sin_number=.. name=.. email=.. password=.. role=.."),
                    Err(e) => Ok(AppCommand::Unknown(e)),
                },
                Some("edit") => match (arg(2), parse_pairs(parts.get(3..).unwrap_or(&[]))) {
                    (Some(sin), Ok(fields)) if !fields.is_empty() => Ok(AppCommand::UserEdit {
                        sin: sin.to_string(),
                        fields,
                    }),
                    (_, Err(e)) => Ok(AppCommand::Unknown(e)),
                    _ => usage("user edit <sin> key=value .."),
                },
                Some("delete") => match arg(2) {
                    Some(sin) => Ok(AppCommand::UserDelete {
                        sin: sin.to_string(),
                    }),
                    None => usage("user delete <sin>"),
                },
                Some("photo") => match (arg(2), arg(3)) {
                    (Some(sin), Some(p)) => Ok(AppCommand::UserPhoto {
                        sin: sin.to_string(),
                        path: p.into(),
                    }),
                    _ => usage("user photo <sin> <path>"),
                },
                _ => usage("user new|edit|delete|photo .."),
            },
            "leave" => match arg(1) {
                Some("filter") => match arg(2) {
                    Some("clear") | None => Ok(AppCommand::LeaveFilterClear),
                    Some(_) => match parse_pairs(&parts[2..]) {
                        Ok(fields) => Ok(AppCommand::LeaveFilter(fields)),
                        Err(e) => Ok(AppCommand::Unknown(e)),
                    },
                },
                Some("edit") => match (arg(2), parse_pairs(parts.get(3..).unwrap_or(&[]))) {
                    (Some(id), Ok(fields)) if !fields.is_empty() => Ok(AppCommand::LeaveEdit {
                        id: id.to_string(),
                        fields,
                    }),
                    (_, Err(e)) => Ok(AppCommand::Unknown(e)),
                    _ => usage("leave edit <id> key=value .."),
                },
                Some("set") => match (arg(2), arg(3), arg(4)) {
                    (Some(id), Some(stage), Some(status)) => Ok(AppCommand::LeaveSet {
                        id: id.to_string(),
                        stage: stage.to_string(),
                        status: status.to_string(),
                    }),
                    _ => usage("leave set <id> <mentor|advisor|hod|placement|principal> <pending|approved|rejected>"),
                },
                Some("delete") => match arg(2) {
                    Some(id) => Ok(AppCommand::LeaveDelete { id: id.to_string() }),
                    None => usage("leave delete <id>"),
                },
                Some("page") => match arg(2).and_then(|n| n.parse::<usize>().ok()) {
                    Some(n) if n >= 1 => Ok(AppCommand::LeavePage(n)),
                    _ => usage("leave page <n>  (从 1 开始)"),
                },
                _ => usage("leave filter|edit|set|delete|page .."),
            },
            "logs" => match arg(1) {
                Some("upload") => match arg(2) {
                    Some(p) => Ok(AppCommand::LogsUpload { path: p.into() }),
                    None => usage("logs upload <csv>"),
                },
                Some("clear") => Ok(AppCommand::LogsClear),
                _ => usage("logs upload <csv> | logs clear"),
            },
            "deleted" => match (arg(1), arg(2)) {
                (Some("search"), _) => Ok(AppCommand::DeletedSearch(rest(2))),
                (Some("restore"), Some(sin)) => Ok(AppCommand::DeletedRestore {
                    sin: sin.to_string(),
                }),
                (Some("purge"), Some(sin)) => Ok(AppCommand::DeletedPurge {
                    sin: sin.to_string(),
                }),
                _ => usage("deleted search <q> | deleted restore <sin> | deleted purge <sin>"),
            },
            "backup" | "backups" => parse_backup(&parts),
            "config" => match arg(1) {
                Some("set") => match parse_pairs(&parts[2..]) {
                    Ok(fields) if !fields.is_empty() => Ok(AppCommand::ConfigSet(fields)),
                    Ok(_) => usage("config set minAttendance=75 gracePeriod=15 .."),
                    Err(e) => Ok(AppCommand::Unknown(e)),
                },
                Some("save") => Ok(AppCommand::ConfigSave),
                Some("reset") => Ok(AppCommand::ConfigReset),
                _ => usage("config set k=v.. | config save | config reset"),
            },
            "semester" => match arg(1) {
                Some("set") => match parse_pairs(&parts[2..]) {
                    Ok(fields) if !fields.is_empty() => Ok(AppCommand::SemesterSet(fields)),
                    Ok(_) => usage("semester set name=.. start=YYYY-MM-DD end=YYYY-MM-DD"),
                    Err(e) => Ok(AppCommand::Unknown(e)),
                },
                Some("save") => Ok(AppCommand::SemesterSave),
                Some("reset") => Ok(AppCommand::SemesterReset),
                _ => usage("semester set k=v.. | semester save | semester reset"),
            },
            "holidays" | "holiday" => match arg(1) {
                Some("upload") => match arg(2) {
                    Some(p) => Ok(AppCommand::HolidaysUpload { path: p.into() }),
                    None => usage("holidays upload <csv>"),
                },
                Some("edit") => match (arg(2), parse_pairs(parts.get(3..).unwrap_or(&[]))) {
                    (Some(id), Ok(fields)) if !fields.is_empty() => Ok(AppCommand::HolidayEdit {
                        id: id.to_string(),
                        fields,
                    }),
                    (_, Err(e)) => Ok(AppCommand::Unknown(e)),
                    _ => usage("holidays edit <id> date=YYYY-MM-DD reason=.."),
                },
                Some("save") => Ok(AppCommand::HolidaysSave),
                Some("reset") => Ok(AppCommand::HolidaysReset),
                Some("delete") => match arg(2) {
                    Some(id) => Ok(AppCommand::HolidayDelete { id: id.to_string() }),
                    None => usage("holidays delete <id>"),
                },
                Some("clear") => Ok(AppCommand::HolidaysClear),
                _ => usage("holidays upload|edit|save|reset|delete|clear .."),
            },
            "profile" => match (arg(1), arg(2)) {
                (Some("photo"), Some(p)) => Ok(AppCommand::ProfilePhoto { path: p.into() }),
                (None, _) => Ok(AppCommand::Open(Section::Profile)),
                _ => usage("profile photo <path>"),
            },
            "logout" => Ok(AppCommand::Logout),
            "help" | "h" => Ok(AppCommand::Help),
            "quit" | "q" | "exit" => Ok(AppCommand::Quit),
            other => Ok(AppCommand::Unknown(format!("未知命令: {}", other))),
        }
    }
}

fn parse_backup(parts: &[String]) -> Result<AppCommand, ()> {
    let arg = |i: usize| parts.get(i).map(String::as_str);
    let id_cmd = |make: fn(String) -> AppCommand, name: &str| match arg(2) {
        Some(id) => Ok(make(id.to_string())),
        None => Ok(AppCommand::Unknown(format!("用法: backup {} <id>", name))),
    };
    match arg(1) {
        Some("create") => {
            // 第一个参数可选地指定类型，其余是描述
            let (backup_type, desc_from) = match arg(2).map(str::parse::<BackupType>) {
                Some(Ok(t)) => (t, 3),
                _ => (BackupType::Full, 2),
            };
            Ok(AppCommand::BackupCreate {
                backup_type,
                description: parts.get(desc_from..).map(|p| p.join(" ")).unwrap_or_default(),
            })
        }
        Some("restore") => id_cmd(|id| AppCommand::BackupRestore { id }, "restore"),
        Some("delete") => id_cmd(|id| AppCommand::BackupDelete { id }, "delete"),
        Some("download") => id_cmd(|id| AppCommand::BackupDownload { id }, "download"),
        Some("schedule") => match (arg(2), arg(3), arg(4)) {
            (None, _, _) => Ok(AppCommand::BackupScheduleShow),
            (Some("off"), _, _) => Ok(AppCommand::BackupScheduleOff),
            (Some("on"), Some(freq), Some(time)) => {
                let parsed = freq
                    .parse::<Frequency>()
                    .and_then(|f| parse_time_of_day(time).map(|t| (f, t)));
                match parsed {
                    Ok((frequency, time)) => Ok(AppCommand::BackupScheduleOn { frequency, time }),
                    Err(e) => Ok(AppCommand::Unknown(e)),
                }
            }
            _ => Ok(AppCommand::Unknown(
                "用法: backup schedule [on <daily|weekly|monthly> <HH:MM> | off]".to_string(),
            )),
        },
        _ => Ok(AppCommand::Unknown(
            "用法: backup create|restore|delete|download|schedule ..".to_string(),
        )),
    }
}

/// 按空白切分，支持双引号包住带空格的参数
pub fn split_args(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    let mut has_token = false;
    for c in s.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                has_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if has_token {
                    out.push(std::mem::take(&mut cur));
                    has_token = false;
                }
            }
            c => {
                cur.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        out.push(cur);
    }
    out
}

/// `key=value` 列表
pub fn parse_pairs(args: &[String]) -> Result<Vec<(String, String)>, String> {
    args.iter()
        .map(|a| match a.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
            _ => Err(format!("参数应为 key=value 形式: {}", a)),
        })
        .collect()
}
