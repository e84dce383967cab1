//! # Parser モジュール
//!
//! Qt Designer の ui ファイル（XML）を読み取り、widget ツリーを構築する。
//!
//! ## ui ファイルの構造
//! ```text
//! <ui version="4.0">
//!  <class>Main</class>
//!  <widget class="QMainWindow" name="Main">
//!   <property name="windowTitle"><string>Main</string></property>
//!   <widget class="QWidget" name="centralwidget">
//!    <layout class="QVBoxLayout" name="verticalLayout">
//!     <item><widget class="QPushButton" name="pushButton"/></item>
//!    </layout>
//!   </widget>
//!   <action name="actionOpen"/>
//!  </widget>
//! </ui>
//! ```
//!
//! widget / layout / action の 3 種類の要素がツリーのノードになる。
//! `<item>` や `<attribute>` のようなコンテナ要素は透過的に辿る。
//! `<property>` は直近のノードの properties に取り込む（参考情報のみ）。
use std::collections::HashMap;

use crate::error::{QtuiError, QtuiResult};

/// ツリーのノードになる要素のタグ名
const NODE_TAGS: [&str; 3] = ["widget", "layout", "action"];

/// ui ファイル内の 1 要素（widget / layout / action）
#[derive(Debug, Clone)]
pub struct WidgetNode {
    /// objectName。名前の無い要素は空文字列（スタブには現れない）
    pub name: String,
    /// Qt クラス名（例: "QMainWindow"）。action は常に "QAction"
    pub class_name: String,
    /// 子ノード（文書順、親が排他的に所有）
    pub children: Vec<WidgetNode>,
    /// property 名 → 生の値。スタブ生成には使わない参考情報
    pub properties: HashMap<String, String>,
}

impl WidgetNode {
    /// 自分以下の全ノードを文書順で収集する
    pub fn walk<'a>(&'a self, out: &mut Vec<&'a WidgetNode>) {
        out.push(self);
        for child in &self.children {
            child.walk(out);
        }
    }
}

/// パース済みの ui ファイル全体
#[derive(Debug, Clone)]
pub struct UiDocument {
    /// トップレベル widget: <ui><widget class="QMainWindow" name="Main">
    /// 規約として name が利用側の Python クラス名と一致する必要がある
    pub top: WidgetNode,
}

impl UiDocument {
    /// 全ノード（トップ widget 含む）を文書順で返す
    pub fn all_nodes(&self) -> Vec<&WidgetNode> {
        let mut nodes = Vec::new();
        self.top.walk(&mut nodes);
        nodes
    }
}

/// ui ファイルの文字列をパースして UiDocument を返す。
/// XML が壊れている場合やルート構造が期待と異なる場合は MalformedLayout。
pub fn parse_ui(source: &str) -> QtuiResult<UiDocument> {
    let doc = roxmltree::Document::parse(source)
        .map_err(|e| QtuiError::MalformedLayout(format!("XML parse error: {}", e)))?;

    // ルート要素のチェック
    let root = doc.root_element();
    if root.tag_name().name() != "ui" {
        return Err(QtuiError::MalformedLayout(
            "root's tagname in xml file should be 'ui'".to_string(),
        ));
    }

    // 最初の widget 子要素がトップ widget
    let top_el = root
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "widget")
        .ok_or_else(|| {
            QtuiError::MalformedLayout("Missing widget node in ui file".to_string())
        })?;

    Ok(UiDocument {
        top: parse_node(top_el)?,
    })
}

/// widget / layout / action 要素を 1 ノードに変換する（再帰）
fn parse_node(el: roxmltree::Node) -> QtuiResult<WidgetNode> {
    let tag = el.tag_name().name();
    let name = el.attribute("name").unwrap_or("").to_string();

    // action 要素は class 属性を持たない。常に QAction
    let class_name = if tag == "action" {
        "QAction".to_string()
    } else {
        match el.attribute("class") {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => {
                return Err(QtuiError::MalformedLayout(format!(
                    "<{}> element without class attribute (name: '{}')",
                    tag, name
                )))
            }
        }
    };

    let mut node = WidgetNode {
        name,
        class_name,
        children: Vec::new(),
        properties: HashMap::new(),
    };
    collect_children(el, &mut node, true)?;
    Ok(node)
}

/// 子要素を辿って children と properties を埋める。
/// ノードにならない要素（item, spacer, attribute 等）は透過的に降りるが、
/// property は直接の子のものだけを取り込む（spacer 等の property を親に混ぜない）
fn collect_children(el: roxmltree::Node, node: &mut WidgetNode, direct: bool) -> QtuiResult<()> {
    for child in el.children().filter(|n| n.is_element()) {
        let tag = child.tag_name().name();
        if NODE_TAGS.contains(&tag) {
            node.children.push(parse_node(child)?);
        } else if tag == "property" {
            if direct {
                if let Some(prop_name) = child.attribute("name") {
                    node.properties
                        .insert(prop_name.to_string(), property_value(child));
                }
            }
        } else if tag == "addaction" {
            // メニュー等からの参照。action 本体は別の場所で宣言されるのでノードにしない
        } else {
            collect_children(child, node, false)?;
        }
    }
    Ok(())
}

/// <property> の生の値を取り出す:
/// <property name="windowTitle"><string>Main</string></property> → "Main"
fn property_value(prop: roxmltree::Node) -> String {
    prop.children()
        .find(|n| n.is_element())
        .and_then(|n| n.text())
        .unwrap_or("")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_UI: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ui version="4.0">
 <class>Main</class>
 <widget class="QMainWindow" name="Main">
  <property name="windowTitle">
   <string>Main</string>
  </property>
  <widget class="QWidget" name="centralwidget">
   <layout class="QVBoxLayout" name="verticalLayout">
    <item>
     <widget class="QPushButton" name="pushButton">
      <property name="text">
       <string>Push me</string>
      </property>
     </widget>
    </item>
    <item>
     <widget class="QLabel" name="label"/>
    </item>
   </layout>
  </widget>
  <widget class="QMenuBar" name="menubar">
   <widget class="QMenu" name="menuFile">
    <addaction name="actionOpen"/>
   </widget>
  </widget>
  <action name="actionOpen"/>
 </widget>
</ui>
"#;

    #[test]
    fn test_parse_top_widget() {
        let doc = parse_ui(MAIN_UI).unwrap();
        assert_eq!(doc.top.class_name, "QMainWindow");
        assert_eq!(doc.top.name, "Main");
        assert_eq!(doc.top.properties.get("windowTitle").unwrap(), "Main");
    }

    #[test]
    fn test_parse_tree_structure() {
        let doc = parse_ui(MAIN_UI).unwrap();
        // トップ直下: centralwidget, menubar, actionOpen
        assert_eq!(doc.top.children.len(), 3);
        let central = &doc.top.children[0];
        assert_eq!(central.name, "centralwidget");
        // layout は <item> を透過してボタンとラベルを子に持つ
        let layout = &central.children[0];
        assert_eq!(layout.class_name, "QVBoxLayout");
        assert_eq!(layout.children.len(), 2);
        assert_eq!(layout.children[0].name, "pushButton");
        assert_eq!(layout.children[1].name, "label");
    }

    #[test]
    fn test_action_is_qaction() {
        let doc = parse_ui(MAIN_UI).unwrap();
        let nodes = doc.all_nodes();
        let action = nodes.iter().find(|n| n.name == "actionOpen").unwrap();
        assert_eq!(action.class_name, "QAction");
    }

    #[test]
    fn test_addaction_is_not_a_node() {
        let doc = parse_ui(MAIN_UI).unwrap();
        let count = doc
            .all_nodes()
            .iter()
            .filter(|n| n.name == "actionOpen")
            .count();
        // <addaction> は参照なので、ノードは <action> の 1 つだけ
        assert_eq!(count, 1);
    }

    #[test]
    fn test_all_nodes_document_order() {
        let doc = parse_ui(MAIN_UI).unwrap();
        let names: Vec<&str> = doc.all_nodes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Main",
                "centralwidget",
                "verticalLayout",
                "pushButton",
                "label",
                "menubar",
                "menuFile",
                "actionOpen",
            ]
        );
    }

    #[test]
    fn test_unnamed_widget_kept_with_empty_name() {
        let src = r#"<ui><widget class="QWidget" name="w">
            <widget class="QFrame"/>
        </widget></ui>"#;
        let doc = parse_ui(src).unwrap();
        assert_eq!(doc.top.children[0].name, "");
        assert_eq!(doc.top.children[0].class_name, "QFrame");
    }

    #[test]
    fn test_spacer_is_transparent() {
        let src = r#"<ui><widget class="QWidget" name="w">
         <layout class="QVBoxLayout" name="lay">
          <item>
           <spacer name="spacer">
            <property name="orientation"><enum>Qt::Vertical</enum></property>
           </spacer>
          </item>
         </layout>
        </widget></ui>"#;
        let doc = parse_ui(src).unwrap();
        let lay = &doc.top.children[0];
        // spacer はノードにならず、その property も親に混ざらない
        assert!(lay.children.is_empty());
        assert!(lay.properties.is_empty());
    }

    #[test]
    fn test_wrong_root_tag() {
        let err = parse_ui("<html><widget class=\"QWidget\" name=\"w\"/></html>").unwrap_err();
        assert!(matches!(err, QtuiError::MalformedLayout(_)));
    }

    #[test]
    fn test_missing_top_widget() {
        let err = parse_ui("<ui version=\"4.0\"><class>Main</class></ui>").unwrap_err();
        assert!(matches!(err, QtuiError::MalformedLayout(_)));
    }

    #[test]
    fn test_broken_xml() {
        let err = parse_ui("<ui><widget class=\"QWidget\"").unwrap_err();
        assert!(matches!(err, QtuiError::MalformedLayout(_)));
    }

    #[test]
    fn test_widget_without_class() {
        let err = parse_ui("<ui><widget name=\"w\"/></ui>").unwrap_err();
        assert!(matches!(err, QtuiError::MalformedLayout(_)));
    }
}
