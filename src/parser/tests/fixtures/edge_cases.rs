// Test fixtures for declarations the structural scanner has to step around

pub const NESTED_TYPES: &str = r#"
using System.Collections.Generic;
using UnityEngine;

namespace Game.Items
{
    public class Inventory : MonoBehaviour
    {
        [System.Serializable]
        public class Slot
        {
            public string itemId;
            public int count;
        }

        public enum SlotKind { Weapon, Armor, Consumable }

        public List<Slot> slots = new List<Slot>();
        public SlotKind filter;

        public Slot Find(string id)
        {
            foreach (var slot in slots)
            {
                if (slot.itemId == id) return slot;
            }
            return null;
        }
    }
}
"#;

pub const GENERIC_CONSTRAINTS: &str = r#"
using System.Collections.Generic;
using UnityEngine;

namespace Game.Core
{
    public abstract class Singleton<T> : MonoBehaviour where T : Singleton<T>
    {
        public static T Instance { get; private set; }

        protected virtual void Awake()
        {
            Instance = this as T;
        }
    }

    public class Repository<TItem> where TItem : class, new()
    {
        private readonly Dictionary<string, TItem> items = new Dictionary<string, TItem>();

        public void Add(string key, TItem item) => items[key] = item;
    }
}
"#;

pub const COMMENTS_AND_STRINGS: &str = r#"
// class Fake : MonoBehaviour { }
namespace Game.Text
{
    /* public class AlsoFake { } */
    public class Dialogue : MonoBehaviour
    {
        private string greeting = "Hello { world";
        private string path = @"C:\temp\{file}";
        private char open = '{';

        void Start()
        {
            Debug.Log($"Greeting: {greeting}");
            // GetComponent<Rigidbody>();
        }
    }
}
"#;

pub const UNBALANCED: &str = r#"
namespace Game.Broken
{
    public class Complete : MonoBehaviour
    {
        void Start() { }
    }

    public class Truncated : MonoBehaviour
    {
        void Update()
        {
            if (true)
            {
"#;

pub const FILE_SCOPED_NAMESPACE: &str = r#"
namespace Game.Tools;

public class LevelLoader : MonoBehaviour
{
    public string sceneName;

    public void Load() => SceneManager.LoadScene(sceneName);
}
"#;
