use urlencoding::encode;

/// 仪表盘
pub const PATH_ADMIN_DASHBOARD: &str = "/admin-dashboard";

/// 设备日志
pub const PATH_DEVICE_LOGS: &str = "/devicelogs";
pub const PATH_UPLOAD_DEVICE_LOGS: &str = "/upload-devicelogs";

/// 已删除用户
pub const PATH_DELETED_USERS: &str = "/deleted-users";
pub const PATH_RESTORE_USER: &str = "/restore-user";
pub const PATH_PERMANENTLY_DELETE_USER: &str = "/permanently-delete-user";

/// 备份。路径里的 id 一律转义，`#`、`/`、`?` 不会改变路由
pub const PATH_BACKUP_CREATE: &str = "/backup/create-backup";
pub const PATH_BACKUP_LIST: &str = "/backup/backups";
pub fn path_backup_restore(id: &str) -> String {
    format!("/backup/restore-backup/{}", encode(id))
}
pub fn path_backup_delete(id: &str) -> String {
    format!("/backup/backup/{}", encode(id))
}
pub fn path_backup_download(id: &str) -> String {
    format!("/backup/download-csv/{}", encode(id))
}

/// 系统配置 / 学期 / 节假日
pub const PATH_SYSTEM_CONFIG: &str = "/system-config";
pub const PATH_SEMESTER_DETAILS: &str = "/semester-details";
pub const PATH_HOLIDAYS: &str = "/holidays";
pub const PATH_UPLOAD_HOLIDAYS: &str = "/upload-holidays";
pub fn path_holiday(id: &str) -> String {
    format!("{}/{}", PATH_HOLIDAYS, encode(id))
}

/// 用户
pub const PATH_GET_USERS: &str = "/get-users";
pub const PATH_CREATE_USER: &str = "/create-user";
pub const PATH_BULK_UPLOAD: &str = "/bulk-upload";
pub fn path_update_user(sin: &str) -> String {
    format!("/update-user/{}", encode(sin))
}
pub fn path_delete_user(sin: &str) -> String {
    format!("/delete-user/{}", encode(sin))
}

/// 请假申请（相对于 leave 资源根）
pub fn path_leave_request(request_id: &str) -> String {
    format!("/{}", encode(request_id))
}

/// 拼接基地址与路径，避免出现 `//`
pub fn join(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() || path == "/" {
        return format!("{}/", base);
    }
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_handles_slashes() {
        assert_eq!(join("http://h:5000/", "/holidays"), "http://h:5000/holidays");
        assert_eq!(join("http://h:5000", "holidays/3"), "http://h:5000/holidays/3");
        assert_eq!(join("http://h/leave", "/"), "http://h/leave/");
    }

    #[test]
    fn ids_are_escaped_in_paths() {
        assert_eq!(path_delete_user("CSE#12"), "/delete-user/CSE%2312");
        assert_eq!(path_update_user("a/b"), "/update-user/a%2Fb");
        assert_eq!(path_leave_request("7?x=1"), "/7%3Fx%3D1");
        assert_eq!(path_holiday("h 1"), "/holidays/h%201");
        assert_eq!(path_backup_download("42"), "/backup/download-csv/42");
    }
}
