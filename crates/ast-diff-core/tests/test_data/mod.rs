//! 测试数据集模块
//!
//! 提供 Python 和 Java 示例源码，以及基于 git 命令行的临时仓库

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Python 示例：类、方法和模块级函数
pub const PYTHON_SAMPLE: &str = r#"#!/usr/bin/env python3
"""Sample Python file for testing AST diff analyzer."""

class UserService:
    """Service for managing users."""

    def __init__(self):
        self.users = []

    def add_user(self, name: str, email: str) -> bool:
        """Add a new user."""
        if not email or "@" not in email:
            return False
        user = {"name": name, "email": email, "active": True}
        self.users.append(user)
        return True

    def get_user(self, email: str):
        """Get user by email."""
        for user in self.users:
            if user["email"] == email:
                return user
        return None


def calculate_total(items: list) -> float:
    """Calculate total price of items."""
    if not items:
        return 0.0
    total = 0.0
    for item in items:
        price = item.get("price", 0.0)
        discount = item.get("discount", 0.0)
        total += price * (1 - discount)
    return round(total, 2)


def main():
    """Main entry point."""
    service = UserService()
    result = service.add_user("Alice", "alice@example.com")
    if result:
        print("User added successfully")
    else:
        print("Failed to add user")


if __name__ == "__main__":
    main()
"#;

/// 修改了第 13、34、43 行的 Python 示例
pub const PYTHON_SAMPLE_MODIFIED: &str = r#"#!/usr/bin/env python3
"""Sample Python file for testing AST diff analyzer."""

class UserService:
    """Service for managing users."""

    def __init__(self):
        self.users = []

    def add_user(self, name: str, email: str) -> bool:
        """Add a new user."""
        if not email or "@" not in email:
            raise ValueError("invalid email")
        user = {"name": name, "email": email, "active": True}
        self.users.append(user)
        return True

    def get_user(self, email: str):
        """Get user by email."""
        for user in self.users:
            if user["email"] == email:
                return user
        return None


def calculate_total(items: list) -> float:
    """Calculate total price of items."""
    if not items:
        return 0.0
    total = 0.0
    for item in items:
        price = item.get("price", 0.0)
        discount = item.get("discount", 0.0)
        total += price * (1 - discount) * item.get("quantity", 1)
    return round(total, 2)


def main():
    """Main entry point."""
    service = UserService()
    result = service.add_user("Alice", "alice@example.com")
    if result:
        print("User added")
    else:
        print("Failed to add user")


if __name__ == "__main__":
    main()
"#;

/// 末尾追加的模块级函数
pub const PYTHON_APPENDIX: &str = "\n\ndef shutdown():\n    print(\"bye\")\n";

/// Java 示例：带构造器、方法和嵌套类的服务类
pub const JAVA_SAMPLE: &str = r#"package com.example.test;

import java.util.ArrayList;
import java.util.List;

public class UserService {
    private List<User> users;

    public UserService() {
        this.users = new ArrayList<>();
    }

    public boolean addUser(String name, String email) {
        if (email == null || !email.contains("@")) {
            return false;
        }
        User user = new User(name, email);
        user.setActive(true);
        users.add(user);
        return true;
    }

    public User getUser(String email) {
        for (User user : users) {
            if (user.getEmail().equals(email)) {
                return user;
            }
        }
        return null;
    }

    private static class User {
        private String name;
        private String email;

        public User(String name, String email) {
            this.name = name;
            this.email = email;
        }

        public String getEmail() {
            return email;
        }
    }
}
"#;

/// 修改了第 14、42 行的 Java 示例
pub const JAVA_SAMPLE_MODIFIED: &str = r#"package com.example.test;

import java.util.ArrayList;
import java.util.List;

public class UserService {
    private List<User> users;

    public UserService() {
        this.users = new ArrayList<>();
    }

    public boolean addUser(String name, String email) {
        if (email == null || email.isBlank()) {
            return false;
        }
        User user = new User(name, email);
        user.setActive(true);
        users.add(user);
        return true;
    }

    public User getUser(String email) {
        for (User user : users) {
            if (user.getEmail().equals(email)) {
                return user;
            }
        }
        return null;
    }

    private static class User {
        private String name;
        private String email;

        public User(String name, String email) {
            this.name = name;
            this.email = email;
        }

        public String getEmail() {
            return email.toLowerCase();
        }
    }
}
"#;

/// 写入临时目录的一对文件，用于比较模式
pub struct ComparePair {
    pub temp_dir: TempDir,
    pub old_file: PathBuf,
    pub new_file: PathBuf,
}

impl ComparePair {
    pub fn create(file_name: &str, old: &str, new: &str) -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let old_dir = temp_dir.path().join("old");
        let new_dir = temp_dir.path().join("new");
        std::fs::create_dir_all(&old_dir)?;
        std::fs::create_dir_all(&new_dir)?;

        let old_file = old_dir.join(file_name);
        let new_file = new_dir.join(file_name);
        std::fs::write(&old_file, old)?;
        std::fs::write(&new_file, new)?;

        Ok(Self {
            temp_dir,
            old_file,
            new_file,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }
}

/// 使用 git 命令行创建的临时仓库
pub struct TestRepo {
    pub temp_dir: TempDir,
}

impl TestRepo {
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let repo = Self { temp_dir };

        repo.git(&["init", "-q"])?;
        repo.git(&["config", "user.name", "Test User"])?;
        repo.git(&["config", "user.email", "test@example.com"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;

        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) -> std::io::Result<()> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
    }

    /// 写入文件并提交，返回提交哈希
    pub fn commit(&self, relative: &str, content: &str, message: &str) -> std::io::Result<String> {
        self.write(relative, content)?;
        self.git(&["add", relative])?;
        self.git(&["commit", "-q", "-m", message])?;
        self.git(&["rev-parse", "HEAD"])
            .map(|hash| hash.trim().to_string())
    }

    pub fn git(&self, args: &[&str]) -> std::io::Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()?;

        if !output.status.success() {
            return Err(std::io::Error::other(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
