use super::*;

/// One parsed corpus file.
#[derive(Debug, Clone)]
pub struct CorpusDocument {
    pub path: PathBuf,
    pub sha256: String,
    pub root: HierarchyItem,
}

impl CorpusDocument {
    pub fn item_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&HierarchyItem> = self.root.sub_items.iter().collect();
        while let Some(item) = stack.pop() {
            count += 1;
            stack.extend(item.sub_items.iter());
        }
        count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CorpusFormat {
    Json,
    Xml,
}

fn corpus_format(path: &Path) -> Option<CorpusFormat> {
    let ext = path.extension().and_then(|ext| ext.to_str())?;
    if ext.eq_ignore_ascii_case("json") {
        Some(CorpusFormat::Json)
    } else if ext.eq_ignore_ascii_case("xml") {
        Some(CorpusFormat::Xml)
    } else {
        None
    }
}

pub fn discover_corpus_files(corpus_dir: &Path) -> Result<Vec<PathBuf>> {
    if !corpus_dir.is_dir() {
        bail!("corpus directory does not exist: {}", corpus_dir.display());
    }

    let entries = fs::read_dir(corpus_dir)
        .with_context(|| format!("failed to read {}", corpus_dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", corpus_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        if corpus_format(&path).is_some() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

pub fn load_corpus_file(path: &Path) -> Result<CorpusDocument> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let sha256 = sha256_bytes(&raw);

    let root = match corpus_format(path) {
        Some(CorpusFormat::Json) => serde_json::from_slice::<HierarchyInput>(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?
            .into_root(),
        Some(CorpusFormat::Xml) => {
            let markup = String::from_utf8(raw)
                .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
            parse_xml_hierarchy(&markup)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => bail!("unsupported corpus file type: {}", path.display()),
    };

    Ok(CorpusDocument {
        path: path.to_path_buf(),
        sha256,
        root,
    })
}

/// Reads `<item level=".." linkname="..">` trees nested through
/// `<sub_items>` containers.
pub fn parse_xml_hierarchy(markup: &str) -> Result<HierarchyItem> {
    let doc = Document::parse(markup)?;
    let Some(top) = doc.document_element() else {
        bail!("hierarchy document has no root element");
    };

    let top_items = if is_named(&doc, top, "item") {
        vec![top]
    } else {
        item_children(&doc, top)
    };
    if top_items.is_empty() {
        bail!("hierarchy document contains no <item> elements");
    }

    let mut order = Vec::new();
    let mut stack: Vec<NodeId> = top_items.iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        order.push(node);
        for child in item_children(&doc, node).into_iter().rev() {
            stack.push(child);
        }
    }

    let mut built: HashMap<NodeId, HierarchyItem> = HashMap::new();
    for &node in order.iter().rev() {
        let mut item = xml_item(&doc, node)?;
        item.sub_items = item_children(&doc, node)
            .into_iter()
            .filter_map(|child| built.remove(&child))
            .collect();
        built.insert(node, item);
    }

    let mut roots: Vec<HierarchyItem> = top_items
        .iter()
        .filter_map(|node| built.remove(node))
        .collect();

    if roots.len() == 1 && roots[0].level == 0 {
        return Ok(roots.remove(0));
    }
    Ok(HierarchyItem::new("root", "", 0).with_children(roots))
}

fn is_named(doc: &Document, node: NodeId, local: &str) -> bool {
    doc.element_name(node)
        .is_some_and(|name| document::local_name(name).eq_ignore_ascii_case(local))
}

fn item_children(doc: &Document, node: NodeId) -> Vec<NodeId> {
    let mut items = Vec::new();
    for &child in doc.children(node) {
        if is_named(doc, child, "item") {
            items.push(child);
        } else if is_named(doc, child, "sub_items") {
            items.extend(
                doc.children(child)
                    .iter()
                    .copied()
                    .filter(|&grandchild| is_named(doc, grandchild, "item")),
            );
        }
    }
    items
}

fn xml_item(doc: &Document, node: NodeId) -> Result<HierarchyItem> {
    let level = match doc.attribute(node, "level") {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .with_context(|| format!("invalid item level {raw:?}"))?,
        None => 0,
    };

    let display_text = ["linkname", "text", "display_text", "name"]
        .iter()
        .find_map(|key| doc.attribute(node, key))
        .map(condense_whitespace)
        .unwrap_or_default();

    let mut item = HierarchyItem::new(doc.attribute(node, "id").unwrap_or_default(), display_text, level);
    item.position_path = doc.attribute(node, "data-ref").map(str::to_string);
    Ok(item)
}
