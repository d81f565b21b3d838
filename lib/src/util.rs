/// Whether `input` contains template syntax: `{{` or `{%` or `{#`.
pub fn is_template(input: &str) -> bool {
    let mut slice = input.as_bytes();
    while let Some(i) = memchr::memchr(b'{', slice) {
        match slice.get(i + 1) {
            Some(b'{') | Some(b'%') | Some(b'#') => return true,
            Some(_) => slice = &slice[(i + 1)..],
            None => return false,
        }
    }

    false
}
