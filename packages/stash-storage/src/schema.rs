/// The full DDL with `\ir` includes inlined, ready to split on `;`.
pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		match line.trim().strip_prefix("\\ir ").map(str::trim) {
			Some("tables/001_users.sql") =>
				out.push_str(include_str!("../../../sql/tables/001_users.sql")),
			Some("tables/002_notes.sql") =>
				out.push_str(include_str!("../../../sql/tables/002_notes.sql")),
			Some("tables/003_bookmarks.sql") =>
				out.push_str(include_str!("../../../sql/tables/003_bookmarks.sql")),
			_ => out.push_str(line),
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn includes_are_inlined_in_dependency_order() {
		let sql = render_schema();
		let users = sql.find("CREATE TABLE IF NOT EXISTS users").expect("users table");
		let notes = sql.find("CREATE TABLE IF NOT EXISTS notes").expect("notes table");
		let bookmarks = sql.find("CREATE TABLE IF NOT EXISTS bookmarks").expect("bookmarks table");

		assert!(users < notes && notes < bookmarks);
		assert!(!sql.contains("\\ir"));
	}
}
