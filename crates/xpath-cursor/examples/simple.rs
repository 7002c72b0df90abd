use std::rc::Rc;

use xpath_cursor::{Error, NodeKind, NodeOrder, NodeTest, Op, Plan, Query, TreeCursor};

/// A minimal element-only tree: no attributes, no namespaces.
#[derive(Debug)]
struct Dom {
    nodes: Vec<NodeRec>,
}

#[derive(Debug)]
struct NodeRec {
    kind: NodeKind,
    name: String,
    text: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug, Clone)]
struct Node {
    dom: Rc<Dom>,
    idx: usize,
}

impl Node {
    fn rec(&self) -> &NodeRec {
        &self.dom.nodes[self.idx]
    }
}

impl TreeCursor for Node {
    fn move_to_parent(&mut self) -> bool {
        match self.rec().parent {
            Some(p) => {
                self.idx = p;
                true
            }
            None => false,
        }
    }

    fn move_to_first_child(&mut self) -> bool {
        match self.rec().children.first() {
            Some(&c) => {
                self.idx = c;
                true
            }
            None => false,
        }
    }

    fn move_to_next_sibling(&mut self) -> bool {
        let Some(parent) = self.rec().parent else { return false };
        let siblings = &self.dom.nodes[parent].children;
        let next = siblings.iter().position(|&s| s == self.idx).and_then(|i| siblings.get(i + 1)).copied();
        match next {
            Some(s) => {
                self.idx = s;
                true
            }
            None => false,
        }
    }

    fn move_to_first_attribute(&mut self) -> bool {
        false
    }

    fn move_to_next_attribute(&mut self) -> bool {
        false
    }

    fn move_to_first_namespace(&mut self) -> bool {
        false
    }

    fn move_to_next_namespace(&mut self) -> bool {
        false
    }

    fn move_to(&mut self, other: &Self) -> bool {
        if !Rc::ptr_eq(&self.dom, &other.dom) {
            return false;
        }
        self.idx = other.idx;
        true
    }

    // nodes are pushed in pre-order, so the index is the document position
    fn compare_position(&self, other: &Self) -> NodeOrder {
        if !Rc::ptr_eq(&self.dom, &other.dom) {
            return NodeOrder::Unknown;
        }
        match self.idx.cmp(&other.idx) {
            std::cmp::Ordering::Less => NodeOrder::Before,
            std::cmp::Ordering::Equal => NodeOrder::Same,
            std::cmp::Ordering::Greater => NodeOrder::After,
        }
    }

    fn is_same_position(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.dom, &other.dom) && self.idx == other.idx
    }

    fn node_kind(&self) -> NodeKind {
        self.rec().kind
    }

    fn local_name(&self) -> &str {
        &self.rec().name
    }

    fn namespace_uri(&self) -> &str {
        ""
    }

    fn value(&self) -> String {
        let mut out = self.rec().text.clone();
        for &c in &self.rec().children {
            out.push_str(&Node { dom: self.dom.clone(), idx: c }.value());
        }
        out
    }
}

/// `<library><shelf><book>Dune</book><book>Emma</book></shelf><shelf><book>Ulysses</book></shelf></library>`
fn library() -> Node {
    let mut nodes = vec![NodeRec { kind: NodeKind::Document, name: String::new(), text: String::new(), parent: None, children: Vec::new() }];
    let mut add = |parent: usize, name: &str, text: &str| {
        let idx = nodes.len();
        nodes.push(NodeRec { kind: NodeKind::Element, name: name.to_string(), text: text.to_string(), parent: Some(parent), children: Vec::new() });
        nodes[parent].children.push(idx);
        idx
    };
    let library = add(0, "library", "");
    let shelf = add(library, "shelf", "");
    add(shelf, "book", "Dune");
    add(shelf, "book", "Emma");
    let shelf = add(library, "shelf", "");
    add(shelf, "book", "Ulysses");
    Node { dom: Rc::new(Dom { nodes }), idx: 0 }
}

fn main() -> Result<(), Error> {
    let root = library();

    // /library/shelf/book[1]
    let shelves = Plan::child(&Plan::child(&Plan::root(), NodeTest::name("library")), NodeTest::name("shelf"));
    let first_books = Plan::filter(&Plan::child(&shelves, NodeTest::name("book")), &Plan::number(1.0));
    for book in Query::new(&first_books).select(&root)? {
        println!("first on its shelf: {}", book.value());
    }

    // //book[. = 'Emma']/ancestor::shelf
    let books = Plan::descendant(&Plan::root(), NodeTest::name("book"), false, false);
    let emma = Plan::filter(&books, &Plan::compare(Op::Eq, &Plan::context(), &Plan::string("Emma")));
    let shelf = Plan::ancestor(&emma, NodeTest::name("shelf"), false);
    let mut query = Query::new(&shelf);
    query.evaluate(&root)?;
    println!("shelves holding Emma: {}", query.count()?);

    // pattern: shelf/book
    let pattern = Plan::child(&Plan::child(&Plan::context(), NodeTest::name("shelf")), NodeTest::name("book"));
    let mut matcher = Query::new(&pattern);
    for book in Query::new(&books).select(&root)? {
        let matched = matcher.match_node(&book)?.is_some();
        println!("{} matches shelf/book: {matched} (priority {})", book.value(), matcher.default_priority());
    }
    Ok(())
}
