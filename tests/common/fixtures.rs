//! Temporary Next.js-style projects for integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp project"),
        }
    }

    pub fn with_file(self, rel: &str, content: &str) -> Self {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().expect("file has a parent")).expect("create dirs");
        fs::write(&path, content).expect("write fixture file");
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }
}

pub const SERVER_PAGE: &str = r#"import { api } from "~/trpc/server";

export default async function Home() {
  const hello = await api.hello.query({ text: "from tRPC" });
  return <main>{hello.greeting}</main>;
}
"#;

pub const CLIENT_PROFILE: &str = r#""use client";

import { api } from "~/trpc/react";

export function Profile() {
  const profile = api.user.profile.useQuery();
  const update = api.user.update.useMutation();
  return <button onClick={() => update.mutate({ name: "x" })}>{profile.data?.name}</button>;
}
"#;

pub const EDGE_ROUTE: &str = r#"export const runtime = "edge";

export async function GET() {
  const posts = await trpc.post.list.query();
  return Response.json(posts);
}
"#;

pub const REPEATED_CLIENT: &str = r#"'use client';
export function Feed() {
  const a = api.x.useQuery();
  const b = api.x.useQuery();
  const c = api.x.useQuery();
  return null;
}
"#;

/// A small project touching every boundary label.
pub fn sample_project() -> TempProject {
    TempProject::new()
        .with_file("package.json", "{ \"name\": \"sample\", \"private\": true }\n")
        .with_file("src/app/page.tsx", SERVER_PAGE)
        .with_file("src/components/Profile.tsx", CLIENT_PROFILE)
        .with_file("src/app/api/posts/route.ts", EDGE_ROUTE)
        .with_file("src/lib/util.ts", "export const add = (a: number, b: number) => a + b;\n")
        .with_file("node_modules/@trpc/client/index.ts", "api.vendor.query();\n")
}
