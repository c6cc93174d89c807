//! Formatted output helpers for CLI commands.

use std::fmt::Write;

use corral_common::types::ContainerSummary;

/// Renders containers as a fixed-width table with a header row.
#[must_use]
pub fn container_table(containers: &[ContainerSummary]) -> String {
    let id_width = column_width("CONTAINER ID", containers.iter().map(|c| c.id.as_str()));
    let name_width = column_width("NAME", containers.iter().map(|c| c.name.as_str()));
    let image_width = column_width("IMAGE", containers.iter().map(|c| c.image.as_str()));
    let created_width = column_width("CREATED", containers.iter().map(|c| c.created_at.as_str()));

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<id_width$}  {:<name_width$}  {:<image_width$}  {:<created_width$}  STATUS",
        "CONTAINER ID", "NAME", "IMAGE", "CREATED"
    );
    for c in containers {
        let _ = writeln!(
            out,
            "{:<id_width$}  {:<name_width$}  {:<image_width$}  {:<created_width$}  {}",
            c.id.as_str(),
            c.name,
            c.image,
            c.created_at,
            c.status
        );
    }
    out
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values.map(str::len).fold(header.len(), usize::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_common::types::{ContainerId, ContainerState};

    fn summary(id: &str, name: &str, status: ContainerState) -> ContainerSummary {
        ContainerSummary {
            id: ContainerId::new(id),
            name: name.into(),
            image: "alpine.img".into(),
            status,
            created_at: "2026-01-01T00:00:00+00:00".into(),
        }
    }

    #[test]
    fn table_has_header_and_one_row_per_container() {
        let table = container_table(&[
            summary("ctr-1", "web", ContainerState::Running),
            summary("ctr-2", "worker", ContainerState::Stopped),
        ]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("CONTAINER ID"));
        assert!(lines[1].contains("web") && lines[1].ends_with("running"));
        assert!(lines[2].contains("worker") && lines[2].ends_with("stopped"));
    }

    #[test]
    fn columns_widen_to_longest_value() {
        let long = "a-very-long-container-name";
        let table = container_table(&[summary("ctr-1", long, ContainerState::Created)]);
        let header = table.lines().next().unwrap();
        let row = table.lines().nth(1).unwrap();
        assert_eq!(header.find("IMAGE"), row.find("alpine.img"));
    }

    #[test]
    fn creation_time_is_shown() {
        let table = container_table(&[summary("ctr-1", "web", ContainerState::Created)]);
        let header = table.lines().next().unwrap();
        let row = table.lines().nth(1).unwrap();
        assert_eq!(header.find("CREATED"), row.find("2026-01-01T00:00:00+00:00"));
        assert!(header.ends_with("STATUS"));
    }
}
