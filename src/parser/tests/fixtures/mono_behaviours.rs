// Test fixtures for plain component scripts and singletons

pub const PLAYER_CONTROLLER: &str = r#"
using UnityEngine;

namespace Game.Player
{
    [RequireComponent(typeof(Rigidbody))]
    [DisallowMultipleComponent]
    public class PlayerController : MonoBehaviour
    {
        [Header("Movement")]
        public float moveSpeed = 5f;
        [SerializeField] private float jumpForce = 7f;
        [SerializeField, Range(0, 1)] private float airControl = 0.5f;
        private Rigidbody body;
        private bool grounded;
        [System.NonSerialized] public int debugCounter;
        public const int MaxJumps = 2;
        public int x, y;

        public bool IsGrounded => grounded;

        void Awake()
        {
            body = GetComponent<Rigidbody>();
        }

        void Update()
        {
            if (Input.GetButtonDown("Jump") && grounded)
            {
                Jump();
            }
        }

        void FixedUpdate()
        {
            Move(Input.GetAxis("Horizontal"));
        }

        private void Jump()
        {
            body.AddForce(Vector3.up * jumpForce, ForceMode.Impulse);
        }

        private void Move(float input)
        {
            float control = grounded ? 1f : airControl;
            body.velocity = new Vector3(input * moveSpeed * control, body.velocity.y, 0f);
        }

        void OnCollisionEnter(Collision collision)
        {
            grounded = true;
        }
    }
}
"#;

pub const GAME_MANAGER: &str = r#"
using System;
using UnityEngine;

namespace Game.Core
{
    public class GameManager : MonoBehaviour
    {
        public static GameManager Instance { get; private set; }

        public event Action<int> OnScoreChanged;
        public event Action OnGameOver;
        public int Score { get; private set; }

        void Awake()
        {
            if (Instance != null && Instance != this)
            {
                Destroy(gameObject);
                return;
            }
            Instance = this;
            DontDestroyOnLoad(gameObject);
        }

        public void AddScore(int points)
        {
            Score += points;
            OnScoreChanged?.Invoke(Score);
        }

        public void EndGame()
        {
            OnGameOver?.Invoke();
        }
    }
}
"#;

pub const GAME_MANAGER_UNGUARDED: &str = r#"
using System;
using UnityEngine;

namespace Game.Core
{
    public class GameManager : MonoBehaviour
    {
        public static GameManager Instance { get; private set; }

        public event Action<int> OnScoreChanged;
        public event Action OnGameOver;
        public int Score { get; private set; }

        public void AddScore(int points)
        {
            Score += points;
            OnScoreChanged?.Invoke(Score);
        }

        public void EndGame()
        {
            OnGameOver?.Invoke();
        }
    }
}
"#;

pub const AUDIO_MANAGER: &str = r#"
using UnityEngine;

namespace Game.Core
{
    public class AudioManager : MonoBehaviour
    {
        public static AudioManager Instance;
        public AudioSource music;

        public void PlayMusic(AudioClip clip)
        {
            music.clip = clip;
            music.Play();
        }
    }
}
"#;

pub const WEAPON_DATA: &str = r#"
using System;
using UnityEngine;

namespace Game.Data
{
    [CreateAssetMenu(fileName = "Weapon", menuName = "Data/Weapon")]
    public abstract class WeaponData : ScriptableObject
    {
        public string displayName;
        public int damage = 10;
        public float fireRate = 0.25f;
        [SerializeField] private AudioClip fireSound;
        public static int Created;
        public GameObject Prefab { get; set; }
        private int uses;
        public int Uses
        {
            get { return uses; }
            set { uses = value < 0 ? 0 : value; }
        }

        public WeaponData() { }
        ~WeaponData() { }

        public float DamagePerSecond() => damage / fireRate;
        public abstract void Ping();
        public delegate void Fired(int shots);
        public event Fired OnFired;
        public Action<int> onReload;
    }
}
"#;
